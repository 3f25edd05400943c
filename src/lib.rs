// Copyright 2025 Cowboy AI, LLC.

//! # CIM Shapes
//!
//! Duck-typed classification of untyped property bags into typed values.
//!
//! Callers describe the typed values they accept as [`RawShape`]s: a
//! constructor, a map of fields (required or optional, literal-valued,
//! typed, defaulted, trust-sensitive, custom-converted) and a function that
//! maps the accepted fields to constructor arguments. Shapes are registered
//! into an immutable [`Catalogue`]; the catalogue arranges them into an
//! entropy-ordered decision tree and uses it to classify arbitrary
//! [`Value`] graphs, bottom-up, with shared substructure classified once.
//!
//! ## Guarantees
//!
//! 1. **Exactly one shape**: a bag is constructed only if exactly one shape
//!    applies; zero is [`ClassifyError::MissingShape`], two or more is
//!    [`ClassifyError::AmbiguousShapes`]
//! 2. **Immutability**: registering returns a new catalogue
//! 3. **Sharing**: a bag reachable twice is classified once and both
//!    references resolve to the same typed value
//! 4. **Cycles**: cyclic input is an error, never a hang
//! 5. **Trust**: untrusted input never reaches a trust-sensitive field
//!
//! ```
//! use std::any::Any;
//! use cim_shapes::{Catalogue, Constructor, RawField, RawShape, Typed, Value, Bag};
//!
//! #[derive(Debug)]
//! struct Celsius(f64);
//!
//! impl Typed for Celsius {
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn type_name(&self) -> &'static str { "Celsius" }
//! }
//!
//! let celsius = RawShape::of(Constructor::new("Celsius", |args: Vec<Value>| {
//!     Ok(Celsius(args[0].as_f64().unwrap_or_default()))
//! }))
//! .field("type", RawField::literal("Celsius"))
//! .field("degrees", RawField::typed(cim_shapes::ExpectedType::Number))
//! .build_arguments(|fields, _, _| Ok(fields.get("degrees").cloned().map(|d| vec![d])));
//!
//! let catalogue = Catalogue::empty().register([&celsius]).unwrap();
//! let input = Bag::new().with("type", "Celsius").with("degrees", 21.5);
//! let typed = catalogue.classify(&Value::from(input)).unwrap();
//! assert_eq!(typed.as_instance().unwrap().downcast_ref::<Celsius>().unwrap().0, 21.5);
//! ```

#![warn(missing_docs)]

mod catalogue;
mod config;
mod context;
mod errors;
mod evaluator;
mod instance;
mod tree;
mod walker;

pub mod shape;
pub mod value;

pub use catalogue::{
    classify, classify_trusted, classify_trusted_with, classify_with, describe_tree,
    register_shapes, Catalogue,
};
pub use config::ClassifierConfig;
pub use context::UserContext;
pub use errors::{ClassifyError, ClassifyResult, MissingShape};
pub use instance::{Constructor, Instance, Typed};
pub use shape::{
    normalize, BuildArgumentsFn, Conversion, ConvertFn, ExpectedType, FieldSpec, Fields, RawField,
    RawShape, ShapeDescriptor, ShapeId,
};
pub use tree::{KeyBranch, TreeDescription, ValueBranch};
pub use value::{Array, Bag, Key, Literal, NodeId, Properties, Symbol, Value, RESERVED_KEYS};
