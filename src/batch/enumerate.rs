//! Work discovery: recursive directory walk with an extension allow-list
//!
//! Enumeration is synchronous and happens before any task is submitted, so
//! a bad root fails the batch start immediately. Unreadable subtrees below
//! the root are logged and skipped; an empty result is a valid no-op batch.

use crate::batch::task::WorkItem;
use crate::error::{ConfigError, EnumerationError};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Default extensions considered images
const DEFAULT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Case-insensitive file extension allow-list
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    allowed: HashSet<String>,
}

impl ExtensionFilter {
    /// Build a filter from extension names
    ///
    /// Accepts entries with or without a leading dot ("jpg" and ".jpg" are
    /// equivalent); matching is case-insensitive.
    pub fn new<I, S>(extensions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        if allowed.is_empty() {
            return Err(ConfigError::EmptyExtensionList);
        }

        Ok(Self { allowed })
    }

    /// The default image allow-list: jpg, jpeg, png
    pub fn default_images() -> Self {
        Self::new(DEFAULT_EXTENSIONS).expect("default extension list is non-empty")
    }

    /// True if `path` has an allowed extension (case-insensitive)
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.allowed.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::default_images()
    }
}

/// Recursively enumerate eligible files under `root`
///
/// Returns items in directory-traversal order - deterministic for a given
/// filesystem snapshot, not sorted. Fails only if the root itself is
/// missing, not a directory, or unreadable.
pub fn enumerate(
    root: &Path,
    filter: &ExtensionFilter,
) -> Result<Vec<WorkItem>, EnumerationError> {
    let meta = std::fs::metadata(root).map_err(|e| root_error(root, e))?;
    if !meta.is_dir() {
        return Err(EnumerationError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    // Canonicalize so every WorkItem carries an absolute path
    let root = root
        .canonicalize()
        .map_err(|e| root_error(root, e))?;

    // Stat can succeed on a directory we cannot list; probe before walking
    std::fs::read_dir(&root).map_err(|e| EnumerationError::Unreadable {
        path: root.clone(),
        reason: e.to_string(),
    })?;

    let mut items = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // An error at depth 0 means the root itself is unreadable
                if e.depth() == 0 {
                    return Err(EnumerationError::Unreadable {
                        path: root.clone(),
                        reason: e.to_string(),
                    });
                }
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_file() && filter.matches(entry.path()) {
            items.push(WorkItem::new(entry.into_path()));
        }
    }

    debug!(root = %root.display(), count = items.len(), "enumeration finished");
    Ok(items)
}

fn root_error(root: &Path, e: io::Error) -> EnumerationError {
    if e.kind() == io::ErrorKind::NotFound {
        EnumerationError::NotFound {
            path: root.to_path_buf(),
        }
    } else {
        EnumerationError::Unreadable {
            path: root.to_path_buf(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_case_insensitive() {
        let filter = ExtensionFilter::default_images();

        assert!(filter.matches(Path::new("/a/photo.jpg")));
        assert!(filter.matches(Path::new("/a/photo.JPG")));
        assert!(filter.matches(Path::new("/a/photo.Jpeg")));
        assert!(filter.matches(Path::new("/a/photo.png")));
        assert!(!filter.matches(Path::new("/a/notes.txt")));
        assert!(!filter.matches(Path::new("/a/no_extension")));
    }

    #[test]
    fn test_filter_accepts_dotted_entries() {
        let filter = ExtensionFilter::new([".tiff", "BMP"]).unwrap();
        assert!(filter.matches(Path::new("/a/scan.TIFF")));
        assert!(filter.matches(Path::new("/a/scan.bmp")));
        assert!(!filter.matches(Path::new("/a/scan.jpg")));
    }

    #[test]
    fn test_empty_filter_rejected() {
        assert!(matches!(
            ExtensionFilter::new(Vec::<String>::new()),
            Err(ConfigError::EmptyExtensionList)
        ));

        // Entries that normalize to nothing count as empty too
        assert!(ExtensionFilter::new(["."]).is_err());
    }

    #[test]
    fn test_missing_root_fails() {
        let err = enumerate(
            Path::new("/definitely/not/a/real/dir"),
            &ExtensionFilter::default_images(),
        )
        .unwrap_err();
        assert!(matches!(err, EnumerationError::NotFound { .. }));
    }
}
