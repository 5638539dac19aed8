//! Hashing utilities for deterministic input fingerprints.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::UtilError;
use crate::fs::{relative_slash_path, walk_files};

/// Hash every file under `dir`, sorted by relative path for determinism.
///
/// Each file contributes its relative path and its content, so renames are
/// detected as well as edits. A missing directory hashes like an empty one.
///
/// # Errors
/// Returns an error if any file found during the walk cannot be read.
pub fn sha256_dir(dir: &Path) -> Result<String, UtilError> {
    let mut hasher = Sha256::new();
    for path in walk_files(dir) {
        let relative = relative_slash_path(dir, &path).unwrap_or_default();
        hasher.update(relative.len().to_le_bytes());
        hasher.update(relative.as_bytes());

        let data = std::fs::read(&path).map_err(|source| UtilError::Io {
            path: path.display().to_string(),
            source,
        })?;
        hasher.update(data.len().to_le_bytes());
        hasher.update(&data);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Combine multiple string parts into a single composite SHA-256 hash.
///
/// Each part is hashed in order with a length prefix to prevent ambiguity.
pub fn sha256_multi(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        // Length-prefix each part to avoid collisions like ["ab","c"] vs ["a","bc"].
        hasher.update(part.len().to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
