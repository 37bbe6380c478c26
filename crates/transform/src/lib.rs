//! Text transforms for EPUB members.
//!
//! Transforms are registered per [`TextType`] in a [`Registry`], which is
//! seeded with a handful of built-in clean-up transforms. [`inject`] then
//! appends the user's find/replace rules, and [`Pipelines`] composes every
//! chain into a single `String -> String` function per type, with `xhtml`
//! sharing the `html` pipeline.
//!
//! ```
//! use epubfix_config::{Config, Metadata};
//! use epubfix_transform::{FileType, Pipelines};
//!
//! let pipelines = Pipelines::build(&Config::default(), &Metadata::new()).unwrap();
//! let html = pipelines.get(FileType::Xhtml).unwrap();
//! assert_eq!(html.apply("a&nbsp;b\r\n".to_string()), "a&#160;b\n");
//! ```

mod builtin;
pub mod error;
mod file_type;
mod inject;
mod pipeline;
mod registry;

pub use crate::builtin::{DublinCore, normalize_newlines, numeric_entities, strip_bom};
pub use crate::file_type::{FileType, TextType};
pub use crate::inject::{REGEXES, inject};
pub use crate::pipeline::{Pipeline, Pipelines};
pub use crate::registry::{Chain, Registry};
use std::sync::Arc;

/// A pure, total function over document text.
pub type Transform = Arc<dyn Fn(String) -> String + Send + Sync>;
