//! Error types for the [`process`](super) module.
//!
//! Apart from [`ErrorKind::Open`] and [`ErrorKind::Reader`], every error
//! concerns a single member and is named after it.

use derive_more::{Display, Error};

/// A processing error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a processing failure.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source archive couldn't be opened; nothing was processed.
    #[display("could not open the source archive")]
    Open,
    /// The archive reader stopped before reaching the end of the archive.
    #[display("archive reader stopped unexpectedly")]
    Reader,
    /// The member couldn't be read out of the archive.
    #[display("could not read `{_0}`")]
    Read(#[error(not(source))] String),
    /// The member's name would place it outside the staging tree.
    #[display("unsafe member path `{_0}`")]
    InvalidPath(#[error(not(source))] String),
    /// A text member isn't valid UTF-8.
    #[display("`{_0}` is not valid UTF-8")]
    Decode(#[error(not(source))] String),
    /// A transform panicked while rewriting the member.
    #[display("transform failed on `{_0}`")]
    Transform(#[error(not(source))] String),
    /// The member couldn't be written to the staging tree.
    #[display("could not stage `{_0}`")]
    Stage(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Stage(_))
    }

    /// Whether the error concerns a single member rather than the whole run.
    pub fn is_per_entry(&self) -> bool {
        !matches!(self, Self::Open | Self::Reader)
    }
}
