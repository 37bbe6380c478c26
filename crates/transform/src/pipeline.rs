use crate::error::Result;
use crate::{Chain, FileType, Registry, TextType, Transform, inject};
use epubfix_config::{Config, Metadata};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

/// A left-to-right composition of a [`Chain`]'s transforms.
///
/// The stages are snapshotted when composed; registering more transforms on
/// the registry afterwards doesn't affect an existing pipeline. Cloning is
/// cheap and clones share the same stages.
#[derive(Clone)]
pub struct Pipeline {
    names: Arc<[String]>,
    stages: Arc<[Transform]>,
}
impl Pipeline {
    /// Compose every transform of `chain`, in registration order.
    pub fn compose(chain: &Chain) -> Self {
        Self {
            names: chain.names().map(str::to_string).collect(),
            stages: chain.transforms().cloned().collect(),
        }
    }

    /// A pipeline without any stages.
    pub fn identity() -> Self {
        Self::compose(&Chain::default())
    }

    /// Run `doc` through each stage in turn, feeding every output into the
    /// next stage.
    pub fn apply(&self, doc: String) -> String {
        self.stages.iter().fold(doc, |doc, stage| stage(doc))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether `self` and `other` are clones of the same composition.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.stages, &other.stages)
    }
}
impl Debug for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("Pipeline").field(&self.names).finish()
    }
}

/// The composed pipeline of every text type, keyed by [`FileType`].
///
/// Composed once during setup. `xhtml` members borrow the `html` pipeline
/// rather than composing their own.
#[derive(Clone, Debug)]
pub struct Pipelines {
    css: Pipeline,
    opf: Pipeline,
    html: Pipeline,
}
impl Pipelines {
    pub fn new(registry: &Registry) -> Self {
        Self {
            css: Pipeline::compose(registry.get(TextType::Css)),
            opf: Pipeline::compose(registry.get(TextType::Opf)),
            html: Pipeline::compose(registry.get(TextType::Html)),
        }
    }

    /// Seed a registry with the built-in transforms for a book's `metadata`,
    /// inject the configured rules, and compose.
    pub fn build(config: &Config, metadata: &Metadata) -> Result<Self> {
        let mut registry = Registry::with_builtins(metadata);
        inject(&mut registry, config)?;
        let pipelines = Self::new(&registry);
        tracing::debug!(
            css = ?pipelines.css.names(),
            opf = ?pipelines.opf.names(),
            html = ?pipelines.html.names(),
            "Composed pipelines",
        );
        Ok(pipelines)
    }

    /// The pipeline for a file type, or [`None`] for types that aren't
    /// transformed (images and the passthrough catch-all).
    pub fn get(&self, file_type: FileType) -> Option<&Pipeline> {
        let text_type = file_type.text_type()?;
        Some(match text_type {
            TextType::Css => &self.css,
            TextType::Opf => &self.opf,
            TextType::Html => &self.html,
        })
    }
}
