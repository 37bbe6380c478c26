//! Pipeline Error Types
//!
//! Each stage has its own error module ([`process`](crate::process::error),
//! [`repackage`](crate::repackage::error)); their errors are raised into an
//! [`ErrorKind`] here at the public entry points, so the error tree records
//! both the stage and the underlying cause.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading, transforming or staging the source archive's members failed.
    #[display("processing failed")]
    Process,
    /// Building or installing the new archive failed.
    #[display("repackaging failed")]
    Repackage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
