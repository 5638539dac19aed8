//! Top-level schema discovery.
//!
//! Discovery is tiered and stops at the first tier that yields a file:
//!
//! 1. the explicit list, resolved against the schema directory;
//! 2. include/exclude globs over the directory tree;
//! 3. content sniffing of `.xml` files for a `messageSchema` root element.
//!
//! An empty result is not an error. The caller marks the job as skipped.
//!
//! Sniffing only looks at the head of each file: a `messageSchema` tag that
//! starts at or beyond byte [`SNIFF_LIMIT`] is not detected.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use regex::bytes::Regex;
use serde::Serialize;
use tracing::debug;

use sbegen_config::manifest::{SbeSettings, Variant};
use sbegen_util::fs::{relative_slash_path, walk_files};

use crate::error::EngineError;

/// A `messageSchema` tag must start within this many leading bytes to be sniffed.
pub const SNIFF_LIMIT: usize = 4096;

/// Bytes read past [`SNIFF_LIMIT`] so a tag starting just before the limit
/// can still be matched in full.
const SNIFF_LOOKAHEAD: usize = 256;

const MESSAGE_SCHEMA_PATTERN: &str = r"<\s*(?:\w+:)?messageSchema\b";

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// How to find the top-level schemas of one variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryPolicy {
    /// Paths relative to the schema directory. Highest precedence.
    pub explicit_list: Vec<String>,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub content_sniff_fallback: bool,
}

impl DiscoveryPolicy {
    /// The policy a module's settings describe for `variant`.
    pub fn from_settings(settings: &SbeSettings, variant: Variant) -> Self {
        Self {
            explicit_list: settings.variant(variant).top_level_schemas.clone(),
            include_globs: settings.include_globs.clone(),
            exclude_globs: settings.exclude_globs.clone(),
            content_sniff_fallback: settings.sniff_fallback,
        }
    }

    /// Validate the glob patterns and build a reusable discoverer.
    ///
    /// # Errors
    /// Returns an error if any include or exclude pattern is not a valid glob.
    pub fn compile(&self) -> Result<SchemaDiscoverer, EngineError> {
        let sniffer = if self.content_sniff_fallback {
            Some(SchemaSniffer::new()?)
        } else {
            None
        };
        Ok(SchemaDiscoverer {
            explicit_list: self
                .explicit_list
                .iter()
                .filter(|entry| !entry.trim().is_empty())
                .cloned()
                .collect(),
            include: compile_globs(&self.include_globs)?,
            exclude: compile_globs(&self.exclude_globs)?,
            sniffer,
        })
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, EngineError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| EngineError::InvalidPattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// The tier that produced a discovery result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryTier {
    ExplicitList,
    Glob,
    ContentSniff,
}

/// A discovered top-level schema, by absolute path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaFile {
    path: PathBuf,
}

impl SchemaFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name, for log lines.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The ordered top-level schemas of one directory, with the tier that found them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discovery {
    /// `None` when every tier came up empty.
    pub tier: Option<DiscoveryTier>,
    pub files: Vec<SchemaFile>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn found(tier: DiscoveryTier, files: Vec<PathBuf>) -> Option<Self> {
        if files.is_empty() {
            return None;
        }
        Some(Self {
            tier: Some(tier),
            files: files.into_iter().map(|path| SchemaFile { path }).collect(),
        })
    }
}

/// A compiled [`DiscoveryPolicy`].
#[derive(Debug, Clone)]
pub struct SchemaDiscoverer {
    explicit_list: Vec<String>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    sniffer: Option<SchemaSniffer>,
}

impl SchemaDiscoverer {
    /// Discover the top-level schemas under `root`.
    ///
    /// Recomputed from the filesystem on every call; an unchanged directory
    /// always yields the same ordered result.
    pub fn discover(&self, root: &Path) -> Discovery {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

        if let Some(found) = Discovery::found(DiscoveryTier::ExplicitList, self.explicit(&root)) {
            debug!(root = %root.display(), "schemas from explicit list");
            return found;
        }

        let files = walk_files(&root);

        if let Some(found) = Discovery::found(DiscoveryTier::Glob, self.globbed(&root, &files)) {
            debug!(root = %root.display(), "schemas from globs");
            return found;
        }

        if let Some(sniffer) = &self.sniffer {
            let sniffed = files
                .into_iter()
                .filter(|path| sniffer.is_message_schema(path))
                .collect();
            if let Some(found) = Discovery::found(DiscoveryTier::ContentSniff, sniffed) {
                debug!(root = %root.display(), "schemas from content sniffing");
                return found;
            }
        }

        Discovery::default()
    }

    /// Explicit entries that exist as regular files, in input order.
    ///
    /// Blank entries were dropped at compile time; the rest are joined onto
    /// `root` as written, without trimming.
    fn explicit(&self, root: &Path) -> Vec<PathBuf> {
        self.explicit_list
            .iter()
            .map(|entry| root.join(entry))
            .filter(|path| path.is_file())
            .collect()
    }

    /// Files matching any include pattern and no exclude pattern, in path order.
    fn globbed(&self, root: &Path, files: &[PathBuf]) -> Vec<PathBuf> {
        files
            .iter()
            .filter(|path| {
                let Some(relative) = relative_slash_path(root, path) else {
                    return false;
                };
                self.include
                    .iter()
                    .any(|p| p.matches_with(&relative, GLOB_OPTIONS))
                    && !self
                        .exclude
                        .iter()
                        .any(|p| p.matches_with(&relative, GLOB_OPTIONS))
            })
            .cloned()
            .collect()
    }
}

/// Discover the top-level schemas under `root` according to `policy`.
///
/// # Errors
/// Returns an error only if the policy contains an invalid glob pattern.
pub fn discover(root: &Path, policy: &DiscoveryPolicy) -> Result<Discovery, EngineError> {
    Ok(policy.compile()?.discover(root))
}

/// Detects a `messageSchema` root element (optionally namespace-prefixed)
/// in the head of an XML file.
#[derive(Debug, Clone)]
pub struct SchemaSniffer {
    pattern: Regex,
}

impl SchemaSniffer {
    /// # Errors
    /// Returns an error if the root-element pattern fails to compile.
    pub fn new() -> Result<Self, EngineError> {
        let pattern =
            Regex::new(MESSAGE_SCHEMA_PATTERN).map_err(|e| EngineError::InvalidPattern {
                pattern: MESSAGE_SCHEMA_PATTERN.to_owned(),
                message: e.to_string(),
            })?;
        Ok(Self { pattern })
    }

    /// Whether `path` is an `.xml` file (any case) whose head holds a
    /// `messageSchema` tag. Unreadable files are not schemas.
    pub fn is_message_schema(&self, path: &Path) -> bool {
        let is_xml = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(".xml"))
            .unwrap_or(false);
        if !is_xml {
            return false;
        }

        let budget = u64::try_from(SNIFF_LIMIT + SNIFF_LOOKAHEAD).unwrap_or(u64::MAX);
        let mut head = Vec::new();
        let read = File::open(path).and_then(|file| file.take(budget).read_to_end(&mut head));
        match read {
            Ok(_) => self.matches_head(&head),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot sniff schema header");
                false
            }
        }
    }

    /// Whether a tag starts within the first [`SNIFF_LIMIT`] bytes of `head`.
    pub fn matches_head(&self, head: &[u8]) -> bool {
        self.pattern
            .find_iter(head)
            .any(|m| m.start() < SNIFF_LIMIT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbe:messageSchema xmlns:sbe="http://fixprotocol.io/2016/sbe" package="orders" id="1" version="0">
</sbe:messageSchema>
"#;

    fn policy(explicit: &[&str], include: &[&str], exclude: &[&str], sniff: bool) -> DiscoveryPolicy {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_owned()).collect();
        DiscoveryPolicy {
            explicit_list: owned(explicit),
            include_globs: owned(include),
            exclude_globs: owned(exclude),
            content_sniff_fallback: sniff,
        }
    }

    fn names(root: &Path, discovery: &Discovery) -> Vec<String> {
        discovery
            .files
            .iter()
            .map(|f| relative_slash_path(root, f.path()).unwrap())
            .collect()
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn explicit_list_wins_over_globs_and_sniffing() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "orders.xml", "<plain/>");
        write(root, "b.sbe.xml", SCHEMA);
        write(root, "c.xml", SCHEMA);

        let d = discover(root, &policy(&["orders.xml"], &["**/*.sbe.xml"], &[], true)).unwrap();
        assert_eq!(d.tier, Some(DiscoveryTier::ExplicitList));
        assert_eq!(names(root, &d), vec!["orders.xml"]);
    }

    #[test]
    fn explicit_list_preserves_order_and_drops_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "z.xml", "");
        write(root, "nested/a.xml", "");

        let d = discover(
            root,
            &policy(&["z.xml", "missing.xml", "", "nested/a.xml"], &[], &[], false),
        )
        .unwrap();
        assert_eq!(names(root, &d), vec!["z.xml", "nested/a.xml"]);
    }

    #[test]
    fn explicit_entries_are_not_trimmed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "orders.xml", "");

        let d = discover(root, &policy(&[" orders.xml", "  "], &[], &[], false)).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn explicit_list_all_missing_falls_through_to_globs() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "b.sbe.xml", "");

        let d = discover(root, &policy(&["gone.xml"], &["**/*.sbe.xml"], &[], false)).unwrap();
        assert_eq!(d.tier, Some(DiscoveryTier::Glob));
        assert_eq!(names(root, &d), vec!["b.sbe.xml"]);
    }

    #[test]
    fn explicit_directory_entry_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("schemas.xml")).unwrap();

        let d = discover(root, &policy(&["schemas.xml"], &[], &[], false)).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn glob_include_exclude_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "venues/zeta.sbe.xml", "");
        write(root, "alpha.sbe.xml", "");
        write(root, "OrderSchema.xml", "");
        write(root, "messages.xml", "");
        write(root, "nested/messages.xml", "");
        write(root, "common-types.sbe.xml", "");
        write(root, "shared/market-types.xml", "");

        let defaults = SbeSettings::default();
        let d = discover(
            root,
            &policy(
                &[],
                &defaults.include_globs.iter().map(String::as_str).collect::<Vec<_>>(),
                &defaults.exclude_globs.iter().map(String::as_str).collect::<Vec<_>>(),
                false,
            ),
        )
        .unwrap();
        assert_eq!(
            names(root, &d),
            vec!["OrderSchema.xml", "alpha.sbe.xml", "messages.xml", "venues/zeta.sbe.xml"]
        );
    }

    #[test]
    fn glob_order_is_plain_string_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "orders.sbe.xml", "");
        write(root, "orders/x.sbe.xml", "");
        write(root, "a-c.sbe.xml", "");
        write(root, "a/b.sbe.xml", "");

        let d = discover(root, &policy(&[], &["**/*.sbe.xml"], &[], false)).unwrap();
        assert_eq!(
            names(root, &d),
            vec!["a-c.sbe.xml", "a/b.sbe.xml", "orders.sbe.xml", "orders/x.sbe.xml"]
        );
    }

    #[test]
    fn sniffed_order_is_plain_string_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "orders/x.xml", SCHEMA);
        write(root, "orders.xml", SCHEMA);

        let d = discover(root, &policy(&[], &[], &[], true)).unwrap();
        assert_eq!(d.tier, Some(DiscoveryTier::ContentSniff));
        assert_eq!(names(root, &d), vec!["orders.xml", "orders/x.xml"]);
    }

    #[test]
    fn end_to_end_glob_scenario() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "a.xml", "<other/>");
        write(root, "b.sbe.xml", "<other/>");

        let d = discover(root, &policy(&[], &["**/*.sbe.xml"], &[], true)).unwrap();
        assert_eq!(names(root, &d), vec!["b.sbe.xml"]);
    }

    #[test]
    fn sniffing_is_last_resort() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "b/orders.XML", SCHEMA);
        write(root, "a/types.xml", "<types/>");
        write(root, "a/quotes.xml", "<messageSchema package=\"q\">");
        write(root, "notes.txt", SCHEMA);

        let d = discover(root, &policy(&[], &["**/*.sbe.xml"], &[], true)).unwrap();
        assert_eq!(d.tier, Some(DiscoveryTier::ContentSniff));
        assert_eq!(names(root, &d), vec!["a/quotes.xml", "b/orders.XML"]);
    }

    #[test]
    fn sniffing_disabled_yields_empty() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "orders.xml", SCHEMA);

        let d = discover(tmp.path(), &policy(&[], &["**/*.sbe.xml"], &[], false)).unwrap();
        assert!(d.is_empty());
        assert!(d.tier.is_none());
    }

    #[test]
    fn sniff_boundary() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let tag = "<messageSchema package=\"late\"></messageSchema>";
        write(root, "at-4095.xml", &format!("{}{tag}", " ".repeat(4095)));
        write(root, "at-4100.xml", &format!("{}{tag}", " ".repeat(4100)));

        let d = discover(root, &policy(&[], &[], &[], true)).unwrap();
        assert_eq!(names(root, &d), vec!["at-4095.xml"]);
    }

    #[test]
    fn sniffer_header_variants() {
        let sniffer = SchemaSniffer::new().unwrap();
        assert!(sniffer.matches_head(b"<messageSchema>"));
        assert!(sniffer.matches_head(b"< sbe:messageSchema id=\"1\">"));
        assert!(!sniffer.matches_head(b"<messageSchemas>"));
        assert!(!sniffer.matches_head(b"<types/>"));
        assert!(!sniffer.matches_head(&[0xff, 0xfe, 0x00, 0x3c]));
    }

    #[test]
    fn empty_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let d = discover(tmp.path(), &policy(&["a.xml"], &["**/*.xml"], &[], true)).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let d = discover(&tmp.path().join("absent"), &policy(&[], &["**/*.xml"], &[], true)).unwrap();
        assert_eq!(d, Discovery::default());
    }

    #[test]
    fn discover_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "x/one.xml", SCHEMA);
        write(root, "two.xml", SCHEMA);
        write(root, "three.xml", SCHEMA);

        let discoverer = policy(&[], &[], &[], true).compile().unwrap();
        assert_eq!(discoverer.discover(root), discoverer.discover(root));
    }

    #[test]
    fn discovered_paths_are_absolute() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.sbe.xml", "");
        let d = discover(tmp.path(), &policy(&[], &["*.sbe.xml"], &[], false)).unwrap();
        assert!(d.files.iter().all(|f| f.path().is_absolute()));
        assert_eq!(d.files.first().map(SchemaFile::file_name).as_deref(), Some("b.sbe.xml"));
    }

    #[test]
    fn invalid_glob_is_error() {
        let err = policy(&[], &["[unclosed"], &[], false).compile().unwrap_err();
        assert!(matches!(err, EngineError::InvalidPattern { .. }));
    }

    #[test]
    fn policy_from_settings_takes_variant_list() {
        let mut settings = SbeSettings::default();
        settings.test.top_level_schemas = vec!["test-orders.xml".to_owned()];
        settings.sniff_fallback = false;

        let p = DiscoveryPolicy::from_settings(&settings, Variant::Test);
        assert_eq!(p.explicit_list, vec!["test-orders.xml"]);
        assert!(!p.content_sniff_fallback);
        assert!(DiscoveryPolicy::from_settings(&settings, Variant::Main)
            .explicit_list
            .is_empty());
    }
}
