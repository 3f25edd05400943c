// Copyright 2025 Cowboy AI, LLC.

//! Typed instances and the constructors that produce them
//!
//! A successful classification ends by invoking a shape's [`Constructor`],
//! which yields an [`Instance`]: a type-erased handle around a value that
//! implements [`Typed`]. Instances are opaque to the classifier; they pass
//! through recursive classification untouched.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Trait for values produced by classification
///
/// # Example
///
/// ```
/// use cim_shapes::Typed;
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct Point { x: f64, y: f64 }
///
/// impl Typed for Point {
///     fn as_any(&self) -> &dyn Any { self }
///     fn type_name(&self) -> &'static str { "Point" }
/// }
/// ```
pub trait Typed: Any + Send + Sync {
    /// Get the value as Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get the name of this type
    fn type_name(&self) -> &'static str;
}

/// Shared handle to a typed value
#[derive(Clone)]
pub struct Instance(Arc<dyn Typed>);

impl Instance {
    /// Wrap a typed value
    pub fn new<T: Typed>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the concrete value
    pub fn downcast_ref<T: Typed>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Check the concrete type
    pub fn is<T: Typed>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Name reported by the typed value
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// `TypeId` of the concrete value
    pub fn value_type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    /// True when both handles share one allocation
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.0.type_name())
    }
}

type ConstructFn = dyn Fn(Vec<Value>) -> anyhow::Result<Instance> + Send + Sync;

/// Constructible capability invoked when a shape matches
///
/// A constructor also serves as an expected-type tag: [`Constructor::is_instance`]
/// accepts instances of the type it produces.
#[derive(Clone)]
pub struct Constructor {
    name: Arc<str>,
    produces: TypeId,
    construct: Arc<ConstructFn>,
}

impl Constructor {
    /// Create a constructor producing `T`
    pub fn new<T, F>(name: impl Into<Arc<str>>, construct: F) -> Self
    where
        T: Typed,
        F: Fn(Vec<Value>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            produces: TypeId::of::<T>(),
            construct: Arc::new(move |args| construct(args).map(Instance::new)),
        }
    }

    /// Constructor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the constructor
    ///
    /// # Errors
    ///
    /// Whatever the constructor function returns, unchanged
    pub fn construct(&self, arguments: Vec<Value>) -> anyhow::Result<Value> {
        (self.construct)(arguments).map(Value::Instance)
    }

    /// True when `value` is an instance of the type this constructor produces
    pub fn is_instance(&self, value: &Value) -> bool {
        matches!(value, Value::Instance(i) if i.value_type_id() == self.produces)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestLabel(String);

    impl Typed for TestLabel {
        fn as_any(&self) -> &dyn Any { self }
        fn type_name(&self) -> &'static str { "TestLabel" }
    }

    #[derive(Debug)]
    struct TestTag;

    impl Typed for TestTag {
        fn as_any(&self) -> &dyn Any { self }
        fn type_name(&self) -> &'static str { "TestTag" }
    }

    fn label_constructor() -> Constructor {
        Constructor::new("TestLabel", |args: Vec<Value>| {
            let text = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("label needs a string"))?;
            Ok(TestLabel(text.to_string()))
        })
    }

    #[test]
    fn test_instance_downcast() {
        let instance = Instance::new(TestLabel("a".to_string()));
        assert!(instance.is::<TestLabel>());
        assert!(!instance.is::<TestTag>());
        assert_eq!(instance.downcast_ref::<TestLabel>(), Some(&TestLabel("a".to_string())));
        assert_eq!(instance.type_name(), "TestLabel");
    }

    #[test]
    fn test_instance_identity() {
        let a = Instance::new(TestTag);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Instance::new(TestTag)));
    }

    #[test]
    fn test_constructor_builds_and_tags() {
        let ctor = label_constructor();
        let value = ctor.construct(vec![Value::from("hello")]).unwrap();
        assert!(ctor.is_instance(&value));
        assert!(!ctor.is_instance(&Value::from(Instance::new(TestTag))));
        assert!(!ctor.is_instance(&Value::from("hello")));
    }

    #[test]
    fn test_constructor_error_passes_through() {
        let err = label_constructor().construct(vec![]).unwrap_err();
        assert_eq!(err.to_string(), "label needs a string");
    }
}
