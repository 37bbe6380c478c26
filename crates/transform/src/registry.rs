use crate::{TextType, Transform, builtin};
use epubfix_config::Metadata;
use std::borrow::Cow;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

/// An ordered mapping of transform name to [`Transform`].
///
/// Iteration order is registration order. Registering a name that already
/// exists replaces that transform without moving it.
#[derive(Clone, Default)]
pub struct Chain {
    transforms: Vec<(Cow<'static, str>, Transform)>,
}
impl Chain {
    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, transform: Transform) {
        let name = name.into();
        match self.transforms.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = transform,
            None => self.transforms.push((name, transform)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Transform> {
        self.transforms.iter().find(|(existing, _)| existing == name).map(|(_, transform)| transform)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.iter().map(|(name, _)| name.as_ref())
    }

    pub fn transforms(&self) -> impl Iterator<Item = &Transform> {
        self.transforms.iter().map(|(_, transform)| transform)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}
impl Debug for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Per-[`TextType`] transform chains.
///
/// One field per text type keeps lookups exhaustive: adding a [`TextType`]
/// variant won't compile until it has a chain.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    css: Chain,
    opf: Chain,
    html: Chain,
}
impl Registry {
    /// A registry with no transforms at all. Every pipeline composed from it
    /// is the identity.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry seeded with the built-in transforms (see [`builtin`]).
    /// `metadata` feeds the OPF `metadata` transform.
    pub fn with_builtins(metadata: &Metadata) -> Self {
        let mut registry = Self::empty();
        for text_type in TextType::ALL {
            registry.register(text_type, "bom", builtin::strip_bom);
            registry.register(text_type, "newlines", builtin::normalize_newlines);
        }
        registry.register(TextType::Html, "entities", builtin::numeric_entities);
        let dublin_core = builtin::DublinCore::new(metadata);
        if !dublin_core.is_empty() {
            registry.register(TextType::Opf, "metadata", move |doc| dublin_core.apply(doc));
        }
        registry
    }

    /// The ordered transforms registered for `text_type`.
    pub fn get(&self, text_type: TextType) -> &Chain {
        match text_type {
            TextType::Css => &self.css,
            TextType::Opf => &self.opf,
            TextType::Html => &self.html,
        }
    }

    fn get_mut(&mut self, text_type: TextType) -> &mut Chain {
        match text_type {
            TextType::Css => &mut self.css,
            TextType::Opf => &mut self.opf,
            TextType::Html => &mut self.html,
        }
    }

    /// Append (or replace, if the name is taken) a transform for `text_type`.
    pub fn register<F>(&mut self, text_type: TextType, name: impl Into<Cow<'static, str>>, transform: F) -> &mut Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.get_mut(text_type).insert(name, Arc::new(transform));
        self
    }
}
