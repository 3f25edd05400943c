// Copyright 2025 Cowboy AI, LLC.

//! Host data model for untyped property bags
//!
//! Classification consumes [`Value`] graphs. Primitives are plain data,
//! [`Bag`] and [`Array`] are shared handles with identity (so callers can
//! build graphs with shared substructure or cycles), and [`Instance`] is the
//! opaque, already-typed variant the classifier never looks inside.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::instance::Instance;

/// Keys with structural meaning in bag representations.
///
/// They are rejected in shape field maps and dropped when input is copied.
pub const RESERVED_KEYS: &[&str] = &["__proto__"];

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Ordered property map used for bags and processed fields
pub type Properties = IndexMap<Key, Value>;

/// A unique, non-string property key
///
/// Two symbols created with the same description are still distinct.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
}

impl Symbol {
    /// Create a fresh symbol
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        }
    }

    /// Human readable description
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Property key: a string or a symbol
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// String key
    Str(Arc<str>),
    /// Symbol key
    Symbol(Symbol),
}

impl Key {
    /// True for keys on the reserved denylist
    pub fn is_reserved(&self) -> bool {
        match self {
            Key::Str(s) => RESERVED_KEYS.contains(&s.as_ref()),
            Key::Symbol(_) => false,
        }
    }

    /// The string form, if this is a string key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Symbol(_) => None,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<Symbol> for Key {
    fn from(symbol: Symbol) -> Self {
        Key::Symbol(symbol)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s:?}"),
            Key::Symbol(sym) => write!(f, "{sym:?}"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

/// Identity of a shared bag or array allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A loosely structured value
#[derive(Clone)]
pub enum Value {
    /// Absent or null value
    Null,
    /// Boolean
    Bool(bool),
    /// Number (all numbers are doubles)
    Number(f64),
    /// String
    String(Arc<str>),
    /// Symbol
    Symbol(Symbol),
    /// Array with optional extra keys
    Array(Array),
    /// Plain bag of properties
    Bag(Bag),
    /// Opaque, already-typed value
    Instance(Instance),
}

impl Value {
    /// Short name of the value's kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Array(_) => "array",
            Value::Bag(_) => "bag",
            Value::Instance(i) => i.type_name(),
        }
    }

    /// Bags and arrays are compound; everything else passes through classification unchanged
    pub fn is_compound(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Bag(_))
    }

    /// Identity of a compound value
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Array(a) => Some(a.node_id()),
            Value::Bag(b) => Some(b.node_id()),
            _ => None,
        }
    }

    /// Number payload
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Bag handle
    pub fn as_bag(&self) -> Option<&Bag> {
        match self {
            Value::Bag(b) => Some(b),
            _ => None,
        }
    }

    /// Array handle
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Typed instance handle
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// True when this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Primitives compare by value; bags, arrays and instances by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Bag(a), Value::Bag(b)) => a.ptr_eq(b),
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// Shallow on purpose: graphs may be cyclic.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Symbol(sym) => write!(f, "{sym:?}"),
            Value::Array(a) => write!(f, "{a:?}"),
            Value::Bag(b) => write!(f, "{b:?}"),
            Value::Instance(i) => write!(f, "{i:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}

impl From<Bag> for Value {
    fn from(bag: Bag) -> Self {
        Value::Bag(bag)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        literal.to_value()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Parsed JSON becomes fresh bags and arrays.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Array(Array::from_values(items.into_iter().map(Value::from)))
            }
            serde_json::Value::Object(map) => {
                Value::Bag(Bag::from_pairs(map.into_iter().map(|(k, v)| (k, Value::from(v)))))
            }
        }
    }
}

/// Shared, mutable bag of properties
///
/// Cloning a `Bag` clones the handle, not the properties.
#[derive(Clone, Default)]
pub struct Bag(Arc<RwLock<Properties>>);

impl Bag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bag from key/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let properties = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self(Arc::new(RwLock::new(properties)))
    }

    /// Builder-style insert
    pub fn with(self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a property, returning the previous value
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.write().insert(key.into(), value.into())
    }

    /// Look up a property
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.read().get(&key.into()).cloned()
    }

    /// Remove a property, keeping the order of the rest
    pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
        self.write().shift_remove(&key.into())
    }

    /// Check for a property
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.read().contains_key(&key.into())
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<Key> {
        self.read().keys().cloned().collect()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current properties
    pub fn snapshot(&self) -> Properties {
        self.read().clone()
    }

    /// Copy of the current properties without reserved keys
    pub(crate) fn scratch_copy(&self) -> Properties {
        self.read()
            .iter()
            .filter(|(k, _)| !k.is_reserved())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Identity of this bag
    pub fn node_id(&self) -> NodeId {
        NodeId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// True when both handles refer to the same bag
    pub fn ptr_eq(&self, other: &Bag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn read(&self) -> RwLockReadGuard<'_, Properties> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Properties> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Bag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.read().keys()).finish()
    }
}

#[derive(Default)]
struct ArrayData {
    elements: Vec<Value>,
    extras: Properties,
}

/// Shared, mutable array
///
/// Besides indexed elements an array may carry extra keys (non-index
/// strings and symbols), which classification preserves.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<ArrayData>>);

impl Array {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array from values
    pub fn from_values<V, I>(values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let elements = values.into_iter().map(Into::into).collect();
        Self(Arc::new(RwLock::new(ArrayData {
            elements,
            extras: Properties::new(),
        })))
    }

    /// Append an element
    pub fn push(&self, value: impl Into<Value>) {
        self.write().elements.push(value.into());
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.read().elements.get(index).cloned()
    }

    /// Number of indexed elements
    pub fn len(&self) -> usize {
        self.read().elements.len()
    }

    /// Check if there are no indexed elements
    pub fn is_empty(&self) -> bool {
        self.read().elements.is_empty()
    }

    /// Copy of the indexed elements
    pub fn elements(&self) -> Vec<Value> {
        self.read().elements.clone()
    }

    /// Set a non-index property
    pub fn set_extra(&self, key: impl Into<Key>, value: impl Into<Value>) {
        self.write().extras.insert(key.into(), value.into());
    }

    /// Look up a non-index property
    pub fn extra(&self, key: impl Into<Key>) -> Option<Value> {
        self.read().extras.get(&key.into()).cloned()
    }

    /// Copy of the non-index properties
    pub fn extras(&self) -> Properties {
        self.read().extras.clone()
    }

    /// Identity of this array
    pub fn node_id(&self) -> NodeId {
        NodeId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// True when both handles refer to the same array
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn snapshot(&self) -> (Vec<Value>, Properties) {
        let data = self.read();
        (data.elements.clone(), data.extras.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, ArrayData> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ArrayData> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.read();
        write!(f, "Array(len={}", data.elements.len())?;
        if !data.extras.is_empty() {
            write!(f, ", extras={:?}", data.extras.keys().collect::<Vec<_>>())?;
        }
        f.write_str(")")
    }
}

/// Primitive value usable as a literal-value constraint
///
/// Equality is strict equality, except that `NaN` equals `NaN` and the two
/// zeros are the same value.
#[derive(Debug, Clone)]
pub enum Literal {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// String
    String(Arc<str>),
    /// Symbol
    Symbol(Symbol),
}

impl Literal {
    /// Literal form of a primitive value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => Some(Literal::Number(*n)),
            Value::String(s) => Some(Literal::String(s.clone())),
            Value::Symbol(sym) => Some(Literal::Symbol(sym.clone())),
            _ => None,
        }
    }

    /// True when `value` is exactly this literal
    pub fn matches(&self, value: &Value) -> bool {
        Literal::from_value(value).is_some_and(|l| &l == self)
    }

    /// Value form
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Symbol(sym) => Value::Symbol(sym.clone()),
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Null, Literal::Null) => true,
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Number(a), Literal::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Symbol(a), Literal::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Null => {}
            Literal::Bool(b) => b.hash(state),
            Literal::Number(n) => {
                // must agree with eq: every NaN alike, -0 == 0
                let bits = if n.is_nan() {
                    f64::NAN.to_bits()
                } else if *n == 0.0 {
                    0u64
                } else {
                    n.to_bits()
                };
                bits.hash(state);
            }
            Literal::String(s) => s.hash(state),
            Literal::Symbol(sym) => sym.hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(Arc::from(s))
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(Arc::from(s))
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Number(f64::from(n))
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<Symbol> for Literal {
    fn from(sym: Symbol) -> Self {
        Literal::Symbol(sym)
    }
}
