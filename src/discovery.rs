//! Document discovery.
//!
//! Finds `.md` documents in a directory, optionally descending into
//! subdirectories. The extension match is case-insensitive.

use glob::{glob_with, MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension of pixel-art documents.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Error during document discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// The search root is missing or is not a directory
    NotADirectory(PathBuf),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::NotADirectory(path) => {
                write!(f, "Not a directory: {}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::InvalidPattern(_, err) => Some(err),
            DiscoveryError::NotADirectory(_) => None,
        }
    }
}

/// Discover documents under `dir`.
///
/// Returns the matching files sorted by path. Unreadable entries are logged
/// and skipped.
pub fn discover_documents(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(dir.to_path_buf()));
    }

    let file_pattern = if recursive {
        format!("**/*.{}", DOCUMENT_EXTENSION)
    } else {
        format!("*.{}", DOCUMENT_EXTENSION)
    };
    let base = Pattern::escape(&dir.to_string_lossy());
    let full_pattern = Path::new(&base).join(&file_pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };
    let paths = glob_with(&pattern_str, options)
        .map_err(|e| DiscoveryError::InvalidPattern(pattern_str.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() && is_document(&path) {
                    files.push(path);
                }
            }
            Err(e) => warn!(error = %e, "skipping unreadable path"),
        }
    }

    files.sort();
    debug!(dir = %dir.display(), count = files.len(), recursive, "discovered documents");
    Ok(files)
}

/// Check whether a path names a document (`.md`, any case).
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "+++\n+++\n").unwrap();
        path
    }

    #[test]
    fn test_discover_flat() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "heart.md");
        create_test_file(temp.path(), "notes.txt");
        create_test_file(temp.path(), "sub/star.md");

        let files = discover_documents(temp.path(), false).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("heart.md"));
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "b.md");
        create_test_file(temp.path(), "a.md");
        create_test_file(temp.path(), "sub/deep/c.md");

        let files = discover_documents(temp.path(), true).unwrap();
        assert_eq!(files.len(), 3);
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_discover_uppercase_extension() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "ICON.MD");

        let files = discover_documents(temp.path(), false).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_discover_skips_directories_named_like_documents() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("folder.md")).unwrap();

        let files = discover_documents(temp.path(), false).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_missing_dir() {
        let temp = TempDir::new().unwrap();
        let err = discover_documents(&temp.path().join("missing"), false).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotADirectory(_)));
    }

    #[test]
    fn test_discover_dir_with_glob_characters() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("[art]");
        create_test_file(&dir, "x.md");

        let files = discover_documents(&dir, false).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_is_document() {
        assert!(is_document(Path::new("heart.md")));
        assert!(is_document(Path::new("dir/HEART.Md")));
        assert!(!is_document(Path::new("heart.markdown")));
        assert!(!is_document(Path::new("heart")));
        assert!(!is_document(Path::new("heart.md.png")));
    }
}
