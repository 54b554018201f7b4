//! Cache Finder - locates packaged artifacts in a directory tree

use crate::core::error::BulkError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File name suffix of npm package archives
pub const ARTIFACT_SUFFIX: &str = ".tgz";

/// Recursively collect every `.tgz` file under `root`.
///
/// Returned paths are rooted at `root` as given (relative stays relative).
/// Entries are visited sorted by file name within each directory, so the
/// result is stable across platforms and filesystems. Entries that cannot
/// be read are skipped with a warning.
///
/// # Errors
///
/// `BulkError::DirectoryNotFound` when `root` does not exist.
///
/// # Examples
///
/// ```no_run
/// use npm_bulk::orchestration::find_artifacts;
/// use std::path::Path;
///
/// let artifacts = find_artifacts(Path::new("./cache")).unwrap();
/// println!("Found {} archives", artifacts.len());
/// ```
pub fn find_artifacts(root: &Path) -> Result<Vec<PathBuf>, BulkError> {
    if !root.exists() {
        return Err(BulkError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut artifacts = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        // Symlinks count when they resolve to a regular file
        if !entry.path().is_file() {
            continue;
        }

        if entry
            .file_name()
            .to_string_lossy()
            .ends_with(ARTIFACT_SUFFIX)
        {
            artifacts.push(entry.into_path());
        }
    }

    debug!("Found {} artifacts under {}", artifacts.len(), root.display());
    Ok(artifacts)
}
