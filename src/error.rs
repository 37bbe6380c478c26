//! Startup Error Types
//!
//! Everything that can stop a run before the first member is processed. All
//! of these are fatal and end the process with a non-zero exit status.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A startup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for startup operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The working directory couldn't be determined.
    #[display("could not determine the working directory")]
    WorkingDirectory,
    /// No source archive was given and none was found.
    #[display("no EPUB given, and none found in {}", _0.display())]
    NoSource(#[error(not(source))] PathBuf),
    /// The source archive doesn't exist.
    #[display("source archive not found: {}", _0.display())]
    SourceNotFound(#[error(not(source))] PathBuf),
    /// A glob pattern couldn't be built for the working directory.
    #[display("could not search {} for input files", _0.display())]
    Discovery(#[error(not(source))] PathBuf),
    /// The configuration file is missing, malformed or invalid.
    #[display("could not load configuration")]
    Config,
    /// The metadata CSV couldn't be read.
    #[display("could not read book metadata")]
    Metadata,
    /// The transform pipelines couldn't be built.
    #[display("could not build transform pipelines")]
    Pipelines,
    /// The staging directory couldn't be prepared.
    #[display("could not prepare the staging directory")]
    Staging,
}
