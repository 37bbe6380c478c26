//! Staging Error Types
//!
//! Every error here concerns a single staged file, apart from
//! [`ErrorKind::InvalidRoot`] and [`ErrorKind::NotEmpty`] which are raised
//! while the staging area is being set up.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A staging error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for staging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes the staging root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The staging root exists but is not a directory, or can't be resolved
    #[display("invalid staging root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// The staging root already holds files, probably from an aborted run
    #[display("staging root is not empty: {}", _0.display())]
    NotEmpty(#[error(not(source))] PathBuf),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
