//! Archive Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive file doesn't exist.
    #[display("archive not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The file isn't a zip container, or its central directory is corrupt.
    /// Don't retry with the same input.
    #[display("invalid or corrupted archive")]
    InvalidArchive,
    /// A single entry couldn't be opened. Other entries may still be fine.
    #[display("unreadable entry #{_0}")]
    InvalidEntry(#[error(not(source))] usize),
    /// A file can't be named inside an archive (not valid UTF-8, or empty).
    #[display("file can't be stored in an archive: {}", _0.display())]
    InvalidName(#[error(not(source))] PathBuf),
    /// An I/O operation failed. Used for writing/encoding.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
