//! Filesystem utilities for sbegen.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::UtilError;

/// Deepest directory level visited by [`walk_files`].
///
/// Symlinked directories are followed, so the walk is bounded both by this
/// depth and by walkdir's ancestor loop detection.
pub const MAX_WALK_DEPTH: usize = 64;

/// Create a directory and all parent directories if they do not exist.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), UtilError> {
    std::fs::create_dir_all(path).map_err(|source| UtilError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Write `content` to `path` via a temporary sibling file and a rename.
///
/// Parent directories are created as needed.
///
/// # Errors
/// Returns an error if the parent directory, the temporary file, or the
/// rename fails.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), UtilError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, content).map_err(|source| UtilError::Io {
        path: tmp_path.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| UtilError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Collect every regular file under `dir`, recursively, ordered by the path
/// as a plain string (so `a-c.xml` sorts before `a/b.xml`).
///
/// Unreadable entries and symlink loops are skipped rather than reported;
/// a missing `dir` yields an empty list. Directories and other non-regular
/// files are never returned.
pub fn walk_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(MAX_WALK_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    files
}

/// Render `path` relative to `root` with `/` separators, for glob matching
/// and stable display. Returns `None` if `path` is not under `root`.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
