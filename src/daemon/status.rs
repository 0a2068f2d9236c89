//! Sidecar status marker at `<project>/.tldr/status`.
//!
//! The daemon writes `indexing` there while it warms up. Reading it lets a
//! caller skip the transport entirely during that window.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonStatus {
    /// Daemon is building its analysis state.
    Indexing,
    /// Marker present with some other content (e.g. `ready`).
    Other(String),
    /// No readable marker.
    Unknown,
}

pub fn status_path(project: &Path) -> PathBuf {
    project.join(".tldr").join("status")
}

/// Read the marker. Any read failure counts as [`DaemonStatus::Unknown`].
pub fn read_status(project: &Path) -> DaemonStatus {
    let path = status_path(project);
    match fs::read_to_string(&path) {
        Ok(content) => match content.trim() {
            "indexing" => DaemonStatus::Indexing,
            other => DaemonStatus::Other(other.to_string()),
        },
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no status marker");
            DaemonStatus::Unknown
        }
    }
}

pub fn is_indexing(project: &Path) -> bool {
    read_status(project) == DaemonStatus::Indexing
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_status(dir: &Path, content: &str) {
        fs::create_dir_all(dir.join(".tldr")).unwrap();
        fs::write(status_path(dir), content).unwrap();
    }

    #[test]
    fn test_missing_marker_is_not_indexing() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_status(tmp.path()), DaemonStatus::Unknown);
        assert!(!is_indexing(tmp.path()));
    }

    #[test]
    fn test_indexing_with_whitespace() {
        let tmp = TempDir::new().unwrap();
        write_status(tmp.path(), "  indexing\n");
        assert!(is_indexing(tmp.path()));
    }

    #[test]
    fn test_other_content_is_not_indexing() {
        let tmp = TempDir::new().unwrap();
        write_status(tmp.path(), "ready\n");
        assert_eq!(read_status(tmp.path()), DaemonStatus::Other("ready".into()));
        assert!(!is_indexing(tmp.path()));
    }

    #[test]
    fn test_unreadable_marker_is_not_indexing() {
        let tmp = TempDir::new().unwrap();
        // A directory where the file should be makes the read fail.
        fs::create_dir_all(status_path(tmp.path())).unwrap();
        assert!(!is_indexing(tmp.path()));
    }
}
