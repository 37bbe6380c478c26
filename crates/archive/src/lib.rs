//! The zip container underneath an EPUB.
//!
//! - [`Archive`] walks the entries of an existing container in archive order,
//!   handing each one to a visitor as a streaming reader so large members are
//!   never buffered here.
//! - [`pack`] assembles a new container from a directory tree the way EPUB
//!   readers expect it: `mimetype` first and stored uncompressed, everything
//!   else deflated. Output is deterministic; packing the same tree twice
//!   yields identical bytes.

pub mod error;
mod pack;
mod read;

pub use crate::pack::{MIMETYPE, entry_name, pack};
pub use crate::read::{Archive, Entry};
