// Copyright 2025 Cowboy AI, LLC.

//! Raw shape descriptions as supplied by callers
//!
//! A [`RawShape`] is an unvalidated description. Every raw shape gets a
//! [`ShapeId`] when created; that id is its identity for catalogue
//! de-duplication. The first successful normalization is remembered on the
//! raw shape, so builder calls made afterwards are not observed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::context::UserContext;
use crate::instance::Constructor;
use crate::shape::descriptor::{Conversion, ExpectedType, Fields, ShapeDescriptor};
use crate::value::{Key, Literal, Value};

static NEXT_SHAPE: AtomicU64 = AtomicU64::new(1);

/// Identity of a raw shape description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

impl ShapeId {
    fn fresh() -> Self {
        Self(NEXT_SHAPE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Custom field conversion: `(value, trusted, context)` to a [`Conversion`]
pub type ConvertFn = dyn Fn(Value, bool, &UserContext) -> anyhow::Result<Conversion> + Send + Sync;

/// Constructor-argument mapping: `None` means the shape does not apply
pub type BuildArgumentsFn =
    dyn Fn(&Fields, bool, &UserContext) -> anyhow::Result<Option<Vec<Value>>> + Send + Sync;

/// Raw description of one field
#[derive(Clone, Default)]
pub struct RawField {
    pub(crate) required: Option<bool>,
    pub(crate) literal: Option<Literal>,
    pub(crate) default: Option<Value>,
    pub(crate) recurse: Option<bool>,
    pub(crate) expected_type: Option<ExpectedType>,
    pub(crate) innocuous: Option<Value>,
    pub(crate) convert: Option<Arc<ConvertFn>>,
}

impl RawField {
    /// A field with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// A field whose value must be exactly `literal`
    pub fn literal(literal: impl Into<Literal>) -> Self {
        Self {
            literal: Some(literal.into()),
            ..Self::default()
        }
    }

    /// A field guarded by an expected type
    pub fn typed(expected: ExpectedType) -> Self {
        Self {
            expected_type: Some(expected),
            ..Self::default()
        }
    }

    /// Explicitly mark the field required or not
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Shorthand for `required(false)`
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Value supplied when the field is absent
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Explicitly enable or disable recursive classification of the value
    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = Some(recurse);
        self
    }

    /// Guard the value by type, keeping every other setting
    pub fn expected_type(mut self, expected: ExpectedType) -> Self {
        self.expected_type = Some(expected);
        self
    }

    /// Substitute `innocuous` for the value unless the call is trusted
    pub fn requires_trust(mut self, innocuous: impl Into<Value>) -> Self {
        self.innocuous = Some(innocuous.into());
        self
    }

    /// Custom conversion, run after every other check
    pub fn convert<F>(mut self, convert: F) -> Self
    where
        F: Fn(Value, bool, &UserContext) -> anyhow::Result<Conversion> + Send + Sync + 'static,
    {
        self.convert = Some(Arc::new(convert));
        self
    }
}

/// Raw, unvalidated shape description
///
/// Validation happens when the shape is normalized, which registration
/// does eagerly.
pub struct RawShape {
    id: ShapeId,
    pub(crate) constructor: Option<Constructor>,
    pub(crate) fields: Option<IndexMap<Key, RawField>>,
    pub(crate) build_arguments: Option<Arc<BuildArgumentsFn>>,
    pub(crate) normalized: OnceLock<Arc<ShapeDescriptor>>,
}

impl RawShape {
    /// An empty description
    pub fn new() -> Self {
        Self {
            id: ShapeId::fresh(),
            constructor: None,
            fields: None,
            build_arguments: None,
            normalized: OnceLock::new(),
        }
    }

    /// A description targeting `constructor`
    pub fn of(constructor: Constructor) -> Self {
        Self::new().constructor(constructor)
    }

    /// Set the target constructor
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Declare a field
    pub fn field(mut self, key: impl Into<Key>, field: RawField) -> Self {
        self.fields
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), field);
        self
    }

    /// Declare an empty field map, so the shape matches only empty bags
    pub fn without_fields(mut self) -> Self {
        self.fields.get_or_insert_with(IndexMap::new);
        self
    }

    /// Set the constructor-argument mapping
    pub fn build_arguments<F>(mut self, build: F) -> Self
    where
        F: Fn(&Fields, bool, &UserContext) -> anyhow::Result<Option<Vec<Value>>>
            + Send
            + Sync
            + 'static,
    {
        self.build_arguments = Some(Arc::new(build));
        self
    }

    /// Identity of this description
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Label used in messages: constructor name and id
    pub fn label(&self) -> String {
        match &self.constructor {
            Some(c) => format!("{}{}", c.name(), self.id),
            None => format!("shape{}", self.id),
        }
    }
}

impl Default for RawShape {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawShape")
            .field("id", &self.id)
            .field("constructor", &self.constructor)
            .field("fields", &self.fields.as_ref().map(|m| m.keys().collect::<Vec<_>>()))
            .field("build_arguments", &self.build_arguments.is_some())
            .field("normalized", &self.normalized.get().is_some())
            .finish()
    }
}
