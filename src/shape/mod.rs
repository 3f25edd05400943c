// Copyright 2025 Cowboy AI, LLC.

//! Shape descriptions
//!
//! Callers describe shapes with [`RawShape`] and [`RawField`]; the
//! [`normalize`] validates them into immutable [`ShapeDescriptor`]s.

pub mod descriptor;
pub mod normalizer;
pub mod raw;

pub use descriptor::{Conversion, ExpectedType, FieldSpec, Fields, ShapeDescriptor};
pub use normalizer::normalize;
pub use raw::{BuildArgumentsFn, ConvertFn, RawField, RawShape, ShapeId};
