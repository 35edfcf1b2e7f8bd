//! Error Types
//!
//! One enum per failure scope:
//! - [`IndexError`]: the image root cannot be indexed, fatal to a whole run
//! - [`UploadError`]: one upload failed, recovered per reference
//! - [`RewriteError`]: one document cannot be read or written, fatal to that document
//!
//! A line without matches and a reference that is missing from the index
//! are not errors; they produce empty results and debug logs.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to build the image index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Image directory not found: {}", .path.display())]
    RootNotFound { path: PathBuf },

    #[error("Image root is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("Image directory is not readable: {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Failure of a single upload
///
/// Cloneable so results can carry it as a diagnostic record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote store rejected upload with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Upload timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Upload task aborted: {0}")]
    Aborted(String),
}

impl UploadError {
    /// Create a transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a permission error
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Whether the failure came from the run-wide wait bound
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether retrying later could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::Aborted(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Io(_) | Self::PermissionDenied(_) => false,
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

/// Failure to rewrite a document
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("Failed to read document {}: {source}", .path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output for {}: {source}", .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move rewritten document into place at {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for rewrite operations
pub type RewriteResult<T> = Result<T, RewriteError>;

impl RewriteError {
    /// Path of the file the failure concerns
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::ReadSource { path, .. }
            | Self::WriteOutput { path, .. }
            | Self::Persist { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_classification() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(UploadError::from(denied), UploadError::PermissionDenied(_)));

        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(UploadError::from(missing), UploadError::Io(_)));
    }

    #[test]
    fn test_retryable() {
        assert!(UploadError::transport("reset").is_retryable());
        assert!(UploadError::Timeout { duration_ms: 10 }.is_retryable());
        assert!(UploadError::Status { status: 503, message: String::new() }.is_retryable());
        assert!(!UploadError::Status { status: 404, message: String::new() }.is_retryable());
        assert!(!UploadError::permission_denied("403").is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = IndexError::RootNotFound { path: PathBuf::from("/missing") };
        assert_eq!(err.to_string(), "Image directory not found: /missing");

        let err = UploadError::Timeout { duration_ms: 1500 };
        assert_eq!(err.to_string(), "Upload timed out after 1500ms");
    }
}
