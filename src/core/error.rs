//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`BlameError`] which covers the failure modes of the
//! git backend, the configuration layer and the CLI. It uses `thiserror` for
//! ergonomic error definitions and includes constructors for common cases.
//!
//! Note that "no repository", "no history" and "no remote" are *not* errors:
//! the annotation engine models them as ordinary display states. Errors that
//! reach the session boundary are logged and folded into those states.
//!
//! # Public API
//! - [`BlameError`]: Main error enum covering all failure modes
//! - [`Result<T>`]: Type alias for `std::result::Result<T, BlameError>`

use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types for git-line-blame
#[derive(Error, Debug)]
pub enum BlameError {
    // Git repository errors
    #[error("Not in a git repository")]
    NotInGitRepo,

    #[error("Git repository error: {0}")]
    GitRepo(#[from] git2::Error),

    #[error("Path is outside the repository working directory: {path}")]
    OutsideWorkdir { path: PathBuf },

    #[error("Repository has no working directory")]
    BareRepository,

    // File operation errors
    #[error("File does not exist: {path}")]
    FileNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Line addressing
    #[error("Line {line} is out of range (1-{max} available)")]
    LineOutOfRange { line: usize, max: usize },

    #[error("Line numbers start at 1 (got 0)")]
    ZeroLine,

    // Runtime errors
    #[error("An annotation session needs a running tokio runtime")]
    NoRuntime,

    #[error("Background git task failed: {0}")]
    BackgroundTask(#[from] tokio::task::JoinError),

    // Configuration errors
    #[error("Could not find configuration directory")]
    ConfigDirectoryNotFound,

    #[error("Failed to read config file '{path}': {source}")]
    ConfigReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    // JSON serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using BlameError
pub type Result<T> = std::result::Result<T, BlameError>;

impl BlameError {
    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an outside-of-workdir error
    pub fn outside_workdir(path: impl Into<PathBuf>) -> Self {
        Self::OutsideWorkdir { path: path.into() }
    }

    /// Create a line out of range error
    pub fn line_out_of_range(line: usize, max: usize) -> Self {
        Self::LineOutOfRange { line, max }
    }

    /// Create a config read failed error
    pub fn config_read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a config parse failed error
    pub fn config_parse_failed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::ConfigParseFailed {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlameError::NotInGitRepo;
        assert_eq!(err.to_string(), "Not in a git repository");
    }

    #[test]
    fn test_file_not_found_error() {
        let err = BlameError::file_not_found("test.txt");
        assert_eq!(err.to_string(), "File does not exist: test.txt");
    }

    #[test]
    fn test_line_out_of_range_error() {
        let err = BlameError::line_out_of_range(12, 3);
        assert_eq!(err.to_string(), "Line 12 is out of range (1-3 available)");
    }

    #[test]
    fn test_outside_workdir_error() {
        let err = BlameError::outside_workdir("/elsewhere/file.rs");
        assert!(err.to_string().contains("/elsewhere/file.rs"));
    }

    #[test]
    fn test_config_read_failed() {
        let path = std::path::PathBuf::from("/test/config.json");
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = BlameError::config_read_failed(&path, io_err);
        assert!(err.to_string().contains("/test/config.json"));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_config_parse_failed() {
        let path = std::path::PathBuf::from("/test/config.json");
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json").unwrap_err();
        let err = BlameError::config_parse_failed(&path, json_err);
        assert!(err.to_string().contains("/test/config.json"));
        assert!(err.to_string().contains("Failed to parse"));
    }
}
