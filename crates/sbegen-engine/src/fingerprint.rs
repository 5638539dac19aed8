//! Input fingerprints for up-to-date checks on generation jobs.

use std::fmt;

use sbegen_util::hash::{sha256_dir, sha256_multi};

use crate::error::EngineError;
use crate::plan::GenerationJob;

/// A SHA-256 hex digest over everything a generator run reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a job.
    ///
    /// Covers the tool coordinate, language, output directory, xinclude
    /// flag, the selected top-level schemas, and the content of every file
    /// under the schema directory, since included files shape the output.
    /// Equal fingerprints mean the job's inputs have not changed.
    ///
    /// # Errors
    /// Returns an error if a file under the schema directory cannot be read.
    pub fn compute(job: &GenerationJob) -> Result<Self, EngineError> {
        let tree_hash = sha256_dir(&job.schema_dir)?;
        let output_dir = job.output_dir.display().to_string();
        let xinclude = job.xinclude_aware.to_string();
        let schemas: Vec<String> = job
            .schemas
            .iter()
            .map(|s| s.path().display().to_string())
            .collect();

        let mut parts: Vec<&str> = vec![
            &job.tool.coordinate,
            &job.language,
            &output_dir,
            &xinclude,
            &tree_hash,
        ];
        parts.extend(schemas.iter().map(String::as_str));

        Ok(Self(sha256_multi(&parts)))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
