//! The on-disk staging tree that mirrors an archive while its members are
//! being rewritten.

pub mod error;
mod path;
mod staging;

pub use crate::path::{entry_path, validate as validate_path};
pub use crate::staging::StagingArea;
