//! The streaming transform pipeline for a single EPUB.
//!
//! A run has two stages, driven by the caller:
//!
//! 1. [`process`] walks the source archive, classifies every member and
//!    either copies it into the staging tree byte for byte or runs it through
//!    its composed text pipeline first. Progress comes back as a stream of
//!    [`ProcessEvent`]s ending in a [`Tally`].
//! 2. [`repackage`] packs the staging tree into a new archive once the tally
//!    shows every member has settled, keeps the original as a backup and
//!    writes the new archive in its place.
//!
//! Everything a run needs is carried by a [`Context`]; nothing is global.

pub mod error;
pub mod process;
pub mod repackage;
#[cfg(test)]
mod testing;

pub use crate::process::{ProcessEvent, Route, Staged, Tally, process};
pub use crate::repackage::{Report, repackage};
use epubfix_config::DEFAULT_BACKUP_PREFIX;
use epubfix_storage::StagingArea;
use epubfix_transform::Pipelines;
use std::path::PathBuf;
use std::time::Instant;

/// Upper bound on members being transformed and staged at the same time.
/// The archive reader pauses while this many are in flight.
pub const MAX_PROCESS_CONCURRENCY: usize = 16;

/// Settings and shared state for a single run over one archive.
#[derive(Clone, Debug)]
pub struct Context {
    /// The archive being rewritten. Replaced by the new archive at the end.
    pub source: PathBuf,
    pub staging: StagingArea,
    pub pipelines: Pipelines,
    /// Prepended to the source's file name to name its backup.
    pub backup_prefix: String,
    /// Leave the staging tree in place after repackaging.
    pub keep_staging: bool,
    /// When the run began; repackaging reports the time elapsed since.
    pub started: Instant,
}
impl Context {
    pub fn new(source: impl Into<PathBuf>, staging: StagingArea, pipelines: Pipelines) -> Self {
        Self {
            source: source.into(),
            staging,
            pipelines,
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            keep_staging: false,
            started: Instant::now(),
        }
    }

    pub fn with_backup_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.backup_prefix = prefix.into();
        self
    }

    pub fn with_keep_staging(mut self, keep: bool) -> Self {
        self.keep_staging = keep;
        self
    }

    pub fn with_started(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }
}
