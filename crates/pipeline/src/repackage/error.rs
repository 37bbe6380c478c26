//! Error types for the [`repackage`](super) module.
//!
//! Only failures that leave the original archive in place are errors here.
//! A failed backup rename or staging cleanup is logged and the run carries
//! on.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A repackaging error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for repackaging operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Called before every member settled. Nothing was touched.
    #[display("not every member has settled")]
    Incomplete,
    /// The staging tree couldn't be listed.
    #[display("could not list the staging tree")]
    Staging,
    /// The new archive couldn't be built. The original is untouched and the
    /// staging tree is kept.
    #[display("could not build the new archive")]
    Build,
    /// The new archive couldn't be written over the original. The staging
    /// tree is kept.
    #[display("could not write the new archive to {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}
