//! Walking the source archive and staging every member.
//!
//! Members are read one at a time, in archive order, on a blocking thread.
//! Binary members (and anything not recognised) are streamed straight into
//! the staging tree from there. Text members are buffered, decoded and handed
//! to the async side, where up to [`MAX_PROCESS_CONCURRENCY`](crate::MAX_PROCESS_CONCURRENCY)
//! of them are transformed and written concurrently, so members may settle
//! out of archive order.
//!
//! A member failing to process is reported and left out of the staging tree;
//! it never stops the walk.

pub mod error;
mod reader;
mod route;
mod stream;
mod tally;

pub use self::route::Route;
pub use self::stream::{ProcessEvent, Staged, process};
pub use self::tally::Tally;
