//! Transform Error Types
//!
//! Transforms themselves are infallible; errors only happen while the
//! registries and pipelines are being set up, and are always fatal.

use derive_more::{Display, Error};

/// A transform setup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transform setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The name doesn't refer to a file type that owns a registry entry.
    #[display("unknown file type: {_0}")]
    UnknownFileType(#[error(not(source))] String),
    /// A find/replace rule could not be compiled into a regex.
    #[display("invalid regex in `regexes.{file_type}` rule #{index}")]
    InvalidRule {
        /// The file type key the rule was listed under.
        file_type: &'static str,
        /// Zero-based position of the rule within its list.
        index: usize,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
