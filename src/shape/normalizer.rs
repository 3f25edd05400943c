// Copyright 2025 Cowboy AI, LLC.

//! Validation of shape descriptions and their identity-keyed memo

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::errors::{ClassifyError, ClassifyResult};
use crate::shape::descriptor::{FieldSpec, ShapeDescriptor};
use crate::shape::raw::RawShape;
use crate::value::RESERVED_KEYS;

/// Validate and compile `raw` into its [`ShapeDescriptor`]
///
/// The first successful result is stored on the raw shape itself and never
/// evicted. Normalizing the same raw shape again returns the same `Arc`, and
/// edits made to the raw shape after that are not observed. Failures are not
/// stored.
///
/// # Errors
///
/// `MalformedShape` when the constructor, the field map or the argument
/// builder is missing, or when a field uses a reserved key
pub fn normalize(raw: &RawShape) -> ClassifyResult<Arc<ShapeDescriptor>> {
    if let Some(hit) = raw.normalized.get() {
        trace!(shape = %hit.label(), "shape already normalized");
        return Ok(hit.clone());
    }
    let descriptor = Arc::new(compile(raw)?);
    // another thread may have won the race; its descriptor is the identity
    Ok(raw.normalized.get_or_init(|| descriptor).clone())
}

fn compile(raw: &RawShape) -> ClassifyResult<ShapeDescriptor> {
    let constructor = raw
        .constructor
        .clone()
        .ok_or_else(|| ClassifyError::malformed(raw.label(), "missing constructor"))?;
    let raw_fields = raw
        .fields
        .as_ref()
        .ok_or_else(|| ClassifyError::malformed(raw.label(), "missing field map"))?;
    let build_arguments = raw
        .build_arguments
        .clone()
        .ok_or_else(|| ClassifyError::malformed(raw.label(), "missing argument builder"))?;

    let mut fields = IndexMap::with_capacity(raw_fields.len());
    for (key, field) in raw_fields {
        if key.is_reserved() {
            return Err(ClassifyError::malformed(
                raw.label(),
                format!("field key {key} is reserved (reserved keys: {RESERVED_KEYS:?})"),
            ));
        }
        let spec = FieldSpec::compile(
            field.required,
            field.literal.clone(),
            field.default.clone(),
            field.recurse,
            field.expected_type.clone(),
            field.innocuous.clone(),
            field.convert.clone(),
        );
        fields.insert(key.clone(), spec);
    }

    Ok(ShapeDescriptor::new(raw.id(), constructor, fields, build_arguments))
}
