// Copyright 2025 Cowboy AI, LLC.

//! Shape catalogues
//!
//! A [`Catalogue`] is an immutable, ordered set of normalized shapes. Adding
//! shapes yields a new catalogue and leaves the original untouched; the
//! classification tree is built lazily, the first time a catalogue
//! classifies or is described.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::context::UserContext;
use crate::errors::ClassifyResult;
use crate::shape::{normalize, RawShape, ShapeDescriptor, ShapeId};
use crate::tree::builder::build_tree;
use crate::tree::{ClassificationTree, TreeDescription};
use crate::value::Value;
use crate::walker::Run;

struct CatalogueInner {
    shapes: Vec<Arc<ShapeDescriptor>>,
    config: ClassifierConfig,
    tree: OnceLock<ClassificationTree>,
}

/// Ordered, immutable collection of shapes plus its classification tree
///
/// Cloning is cheap and shares the built tree.
#[derive(Clone)]
pub struct Catalogue {
    inner: Arc<CatalogueInner>,
}

impl Catalogue {
    /// The empty catalogue, with default configuration
    pub fn empty() -> Self {
        Self::assemble(Vec::new(), ClassifierConfig::default())
    }

    /// An empty catalogue using `config`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `config` fails [`ClassifierConfig::validate`]
    pub fn with_config(config: ClassifierConfig) -> ClassifyResult<Self> {
        config.validate()?;
        Ok(Self::assemble(Vec::new(), config))
    }

    fn assemble(shapes: Vec<Arc<ShapeDescriptor>>, config: ClassifierConfig) -> Self {
        Self {
            inner: Arc::new(CatalogueInner {
                shapes,
                config,
                tree: OnceLock::new(),
            }),
        }
    }

    /// A new catalogue holding this catalogue's shapes followed by `raws`
    ///
    /// Shapes already present (the same raw shape registered before) are
    /// skipped, so registering is idempotent. Nothing is registered if any
    /// raw shape is malformed.
    ///
    /// # Errors
    ///
    /// `MalformedShape` for the first raw shape that fails validation
    pub fn register<'r, I>(&self, raws: I) -> ClassifyResult<Catalogue>
    where
        I: IntoIterator<Item = &'r RawShape>,
    {
        let normalized = raws
            .into_iter()
            .map(normalize)
            .collect::<ClassifyResult<Vec<_>>>()?;

        let mut shapes: IndexMap<ShapeId, Arc<ShapeDescriptor>> = self
            .inner
            .shapes
            .iter()
            .map(|shape| (shape.id(), shape.clone()))
            .collect();
        let before = shapes.len();
        for shape in normalized {
            shapes.entry(shape.id()).or_insert(shape);
        }
        debug!(
            added = shapes.len() - before,
            total = shapes.len(),
            "registered shapes"
        );

        Ok(Self::assemble(
            shapes.into_values().collect(),
            self.inner.config.clone(),
        ))
    }

    /// Normalized shapes, in registration order
    pub fn shapes(&self) -> &[Arc<ShapeDescriptor>] {
        &self.inner.shapes
    }

    /// Number of shapes
    pub fn len(&self) -> usize {
        self.inner.shapes.len()
    }

    /// Check if the catalogue has no shapes
    pub fn is_empty(&self) -> bool {
        self.inner.shapes.is_empty()
    }

    /// Configuration shared with derived catalogues
    pub fn config(&self) -> &ClassifierConfig {
        &self.inner.config
    }

    pub(crate) fn tree(&self) -> &ClassificationTree {
        self.inner
            .tree
            .get_or_init(|| build_tree(&self.inner.shapes, &self.inner.config))
    }

    /// Classify `value` as untrusted input
    ///
    /// # Errors
    ///
    /// `MissingShape`, `AmbiguousShapes`, `CycleDetected`, `DepthExceeded`,
    /// or a `Callback` error raised by a shape's callbacks
    pub fn classify(&self, value: &Value) -> ClassifyResult<Value> {
        self.classify_with(value, &UserContext::none())
    }

    /// Classify untrusted input, passing `context` to every callback
    pub fn classify_with(&self, value: &Value, context: &UserContext) -> ClassifyResult<Value> {
        self.run(value, false, context)
    }

    /// Classify `value` as trusted input
    ///
    /// Fields that require trust are accepted as given instead of being
    /// replaced by their innocuous value.
    pub fn classify_trusted(&self, value: &Value) -> ClassifyResult<Value> {
        self.classify_trusted_with(value, &UserContext::none())
    }

    /// Classify trusted input, passing `context` to every callback
    pub fn classify_trusted_with(&self, value: &Value, context: &UserContext) -> ClassifyResult<Value> {
        self.run(value, true, context)
    }

    fn run(&self, value: &Value, trusted: bool, context: &UserContext) -> ClassifyResult<Value> {
        Run::new(self, trusted, context).classify(value)
    }

    /// Description of the classification tree, building it if needed
    pub fn describe_tree(&self) -> TreeDescription {
        self.tree().describe()
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<String> = self.inner.shapes.iter().map(|s| s.label()).collect();
        f.debug_struct("Catalogue")
            .field("shapes", &labels)
            .field("config", &self.inner.config)
            .field("tree_built", &self.inner.tree.get().is_some())
            .finish()
    }
}

/// Register `raws` on top of `catalogue`; see [`Catalogue::register`]
pub fn register_shapes<'r, I>(catalogue: &Catalogue, raws: I) -> ClassifyResult<Catalogue>
where
    I: IntoIterator<Item = &'r RawShape>,
{
    catalogue.register(raws)
}

/// Classify untrusted `value` against `catalogue`
pub fn classify(catalogue: &Catalogue, value: &Value) -> ClassifyResult<Value> {
    catalogue.classify(value)
}

/// Classify trusted `value` against `catalogue`
pub fn classify_trusted(catalogue: &Catalogue, value: &Value) -> ClassifyResult<Value> {
    catalogue.classify_trusted(value)
}

/// Classify untrusted `value`, passing `context` to every callback
pub fn classify_with(
    catalogue: &Catalogue,
    value: &Value,
    context: &UserContext,
) -> ClassifyResult<Value> {
    catalogue.classify_with(value, context)
}

/// Classify trusted `value`, passing `context` to every callback
pub fn classify_trusted_with(
    catalogue: &Catalogue,
    value: &Value,
    context: &UserContext,
) -> ClassifyResult<Value> {
    catalogue.classify_trusted_with(value, context)
}

/// Describe the classification tree of `catalogue`
pub fn describe_tree(catalogue: &Catalogue) -> TreeDescription {
    catalogue.describe_tree()
}
