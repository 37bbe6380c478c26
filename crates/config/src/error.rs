//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every configuration error is fatal:
//! nothing gets processed until the configuration loads and validates.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration file does not exist (or is not a regular file).
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The file extension doesn't map to a supported configuration format.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// The configuration could not be parsed into the expected structure.
    #[display("malformed configuration: {}", _0.display())]
    Malformed(#[error(not(source))] PathBuf),
    /// A find/replace rule contains a pattern that doesn't compile.
    #[display("invalid regex in `regexes.{file_type}` rule #{index}: {find}")]
    InvalidRule {
        /// The file type key the rule was listed under.
        file_type: String,
        /// Zero-based position of the rule within its list.
        index: usize,
        /// The offending pattern source.
        find: String,
    },
    /// A rule's replacement has a group reference that wouldn't expand the
    /// way it reads, like `$1a` or `$&`.
    #[display("ambiguous group reference `{reference}` in `regexes.{file_type}` rule #{index}; use `${{1}}` style")]
    AmbiguousReplacement {
        file_type: String,
        index: usize,
        reference: String,
    },
    /// The metadata CSV could not be read or parsed.
    #[display("unreadable metadata CSV: {}", _0.display())]
    Csv(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration is either valid or it isn't; the user has to fix it.
        false
    }
}
