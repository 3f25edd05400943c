// Copyright 2025 Cowboy AI, LLC.

//! Normalized, immutable shape descriptors

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::context::UserContext;
use crate::instance::{Constructor, Typed};
use crate::shape::raw::{BuildArgumentsFn, ConvertFn, ShapeId};
use crate::value::{Key, Literal, Properties, Value};

/// Type guard for a field value
#[derive(Clone, Debug)]
pub enum ExpectedType {
    /// Null
    Null,
    /// Boolean
    Boolean,
    /// Number
    Number,
    /// String
    String,
    /// Symbol
    Symbol,
    /// Array (only meaningful for fields that are not recursed into)
    Array,
    /// Plain bag (only meaningful for fields that are not recursed into)
    Bag,
    /// Instance produced by the given constructor
    Instance(Constructor),
}

impl ExpectedType {
    /// True when `value` passes the guard
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            ExpectedType::Null => matches!(value, Value::Null),
            ExpectedType::Boolean => matches!(value, Value::Bool(_)),
            ExpectedType::Number => matches!(value, Value::Number(_)),
            ExpectedType::String => matches!(value, Value::String(_)),
            ExpectedType::Symbol => matches!(value, Value::Symbol(_)),
            ExpectedType::Array => matches!(value, Value::Array(_)),
            ExpectedType::Bag => matches!(value, Value::Bag(_)),
            ExpectedType::Instance(ctor) => ctor.is_instance(value),
        }
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedType::Null => f.write_str("null"),
            ExpectedType::Boolean => f.write_str("boolean"),
            ExpectedType::Number => f.write_str("number"),
            ExpectedType::String => f.write_str("string"),
            ExpectedType::Symbol => f.write_str("symbol"),
            ExpectedType::Array => f.write_str("array"),
            ExpectedType::Bag => f.write_str("bag"),
            ExpectedType::Instance(ctor) => f.write_str(ctor.name()),
        }
    }
}

/// Result of a custom field conversion
#[derive(Debug, Clone)]
pub enum Conversion {
    /// Use this value for the field
    Value(Value),
    /// The shape does not apply to this input
    NotApplicable,
}

impl Conversion {
    /// Convenience for `Conversion::Value`
    pub fn value(value: impl Into<Value>) -> Self {
        Conversion::Value(value.into())
    }
}

/// Why a field value made a shape inapplicable
#[derive(Debug, Clone)]
pub(crate) enum Inapplicable {
    LiteralMismatch { expected: Literal, found: &'static str },
    TypeMismatch { expected: String, found: &'static str },
    Rejected,
}

impl fmt::Display for Inapplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inapplicable::LiteralMismatch { expected, found } => {
                write!(f, "expected literal {expected}, found {found}")
            }
            Inapplicable::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Inapplicable::Rejected => f.write_str("rejected by convert"),
        }
    }
}

/// Processed field values handed to a shape's argument builder
#[derive(Debug, Clone, Default)]
pub struct Fields(Properties);

impl Fields {
    pub(crate) fn new(properties: Properties) -> Self {
        Self(properties)
    }

    /// Look up a field
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.0.get(&key.into())
    }

    /// Number-valued field
    pub fn number(&self, key: impl Into<Key>) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// String-valued field
    pub fn string(&self, key: impl Into<Key>) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Instance-valued field of type `T`
    pub fn instance<T: Typed>(&self, key: impl Into<Key>) -> Option<&T> {
        self.get(key)
            .and_then(Value::as_instance)
            .and_then(|i| i.downcast_ref::<T>())
    }

    /// Check for a field
    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.0.contains_key(&key.into())
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.0.iter()
    }

    /// Number of fields with a value
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Composed per-field conversion.
///
/// Stages run in order: literal check, type guard, trust substitution,
/// custom convert. Absent entirely when a field has none of them.
#[derive(Clone)]
struct FieldConversion {
    literal: Option<Literal>,
    expected_type: Option<ExpectedType>,
    innocuous: Option<Value>,
    convert: Option<Arc<ConvertFn>>,
}

impl FieldConversion {
    fn apply(
        &self,
        value: Value,
        trusted: bool,
        context: &UserContext,
    ) -> anyhow::Result<Result<Value, Inapplicable>> {
        if let Some(literal) = &self.literal {
            if !literal.matches(&value) {
                return Ok(Err(Inapplicable::LiteralMismatch {
                    expected: literal.clone(),
                    found: value.kind(),
                }));
            }
        }
        if let Some(expected) = &self.expected_type {
            if !expected.admits(&value) {
                return Ok(Err(Inapplicable::TypeMismatch {
                    expected: expected.to_string(),
                    found: value.kind(),
                }));
            }
        }
        let value = match &self.innocuous {
            Some(innocuous) if !trusted => innocuous.clone(),
            _ => value,
        };
        match &self.convert {
            Some(convert) => match convert(value, trusted, context)? {
                Conversion::Value(v) => Ok(Ok(v)),
                Conversion::NotApplicable => Ok(Err(Inapplicable::Rejected)),
            },
            None => Ok(Ok(value)),
        }
    }
}

/// Normalized description of one field
#[derive(Clone)]
pub struct FieldSpec {
    required: bool,
    literal: Option<Literal>,
    default: Option<Value>,
    recurse: bool,
    expected_type: Option<ExpectedType>,
    innocuous: Option<Value>,
    conversion: Option<FieldConversion>,
}

impl FieldSpec {
    pub(crate) fn compile(
        required: Option<bool>,
        literal: Option<Literal>,
        default: Option<Value>,
        recurse: Option<bool>,
        expected_type: Option<ExpectedType>,
        innocuous: Option<Value>,
        convert: Option<Arc<ConvertFn>>,
    ) -> Self {
        let required = required.unwrap_or(default.is_none());
        let recurse = recurse.unwrap_or(literal.is_none());
        let conversion = (literal.is_some()
            || expected_type.is_some()
            || innocuous.is_some()
            || convert.is_some())
        .then(|| FieldConversion {
            literal: literal.clone(),
            expected_type: expected_type.clone(),
            innocuous: innocuous.clone(),
            convert,
        });
        Self {
            required,
            literal,
            default,
            recurse,
            expected_type,
            innocuous,
            conversion,
        }
    }

    /// Whether the key must be present
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Literal-value constraint
    pub fn literal(&self) -> Option<&Literal> {
        self.literal.as_ref()
    }

    /// Default value supplied when absent
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the value is classified recursively before conversion
    pub fn recurses(&self) -> bool {
        self.recurse
    }

    /// Type guard
    pub fn expected_type(&self) -> Option<&ExpectedType> {
        self.expected_type.as_ref()
    }

    /// Whether untrusted values are replaced
    pub fn requires_trust(&self) -> bool {
        self.innocuous.is_some()
    }

    /// Substitute used for untrusted values
    pub fn innocuous_value(&self) -> Option<&Value> {
        self.innocuous.as_ref()
    }

    /// Whether a conversion step exists for this field
    pub fn needs_conversion(&self) -> bool {
        self.conversion.is_some()
    }

    pub(crate) fn convert(
        &self,
        value: Value,
        trusted: bool,
        context: &UserContext,
    ) -> anyhow::Result<Result<Value, Inapplicable>> {
        match &self.conversion {
            Some(conversion) => conversion.apply(value, trusted, context),
            None => Ok(Ok(value)),
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("required", &self.required)
            .field("literal", &self.literal)
            .field("default", &self.default)
            .field("recurse", &self.recurse)
            .field("expected_type", &self.expected_type)
            .field("requires_trust", &self.requires_trust())
            .finish()
    }
}

/// Normalized, immutable shape descriptor
pub struct ShapeDescriptor {
    id: ShapeId,
    constructor: Constructor,
    fields: IndexMap<Key, FieldSpec>,
    build_arguments: Arc<BuildArgumentsFn>,
    required_keys: IndexSet<Key>,
    keys_with_default: IndexSet<Key>,
    keys_needing_conversion: IndexSet<Key>,
    keys_to_recurse: IndexSet<Key>,
}

impl ShapeDescriptor {
    pub(crate) fn new(
        id: ShapeId,
        constructor: Constructor,
        fields: IndexMap<Key, FieldSpec>,
        build_arguments: Arc<BuildArgumentsFn>,
    ) -> Self {
        let keys_where = |pred: fn(&FieldSpec) -> bool| -> IndexSet<Key> {
            fields
                .iter()
                .filter(|(_, spec)| pred(spec))
                .map(|(k, _)| k.clone())
                .collect()
        };
        let required_keys = keys_where(|s| s.required);
        let keys_with_default = keys_where(|s| s.default.is_some());
        let keys_needing_conversion = keys_where(|s| s.conversion.is_some());
        let keys_to_recurse = keys_where(|s| s.recurse);
        Self {
            id,
            constructor,
            fields,
            build_arguments,
            required_keys,
            keys_with_default,
            keys_needing_conversion,
            keys_to_recurse,
        }
    }

    /// Identity of the raw description this came from
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Constructor name and id, e.g. `Point#3`
    pub fn label(&self) -> String {
        format!("{}{}", self.constructor.name(), self.id)
    }

    /// Target constructor
    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &IndexMap<Key, FieldSpec> {
        &self.fields
    }

    /// A single field
    pub fn field(&self, key: &Key) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    /// Keys that must be present
    pub fn required_keys(&self) -> &IndexSet<Key> {
        &self.required_keys
    }

    /// Keys with a default value
    pub fn keys_with_default(&self) -> &IndexSet<Key> {
        &self.keys_with_default
    }

    /// Keys with a conversion step, in declaration order
    pub fn keys_needing_conversion(&self) -> &IndexSet<Key> {
        &self.keys_needing_conversion
    }

    /// Keys whose values are classified recursively
    pub fn keys_to_recurse(&self) -> &IndexSet<Key> {
        &self.keys_to_recurse
    }

    pub(crate) fn build_arguments(
        &self,
        fields: &Fields,
        trusted: bool,
        context: &UserContext,
    ) -> anyhow::Result<Option<Vec<Value>>> {
        (self.build_arguments)(fields, trusted, context)
    }
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeDescriptor")
            .field("label", &self.label())
            .field("fields", &self.fields)
            .finish()
    }
}
