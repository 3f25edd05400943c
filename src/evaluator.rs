// Copyright 2025 Cowboy AI, LLC.

//! Candidate evaluation
//!
//! Each candidate a leaf offers is screened in order: key-set check,
//! required keys, recursive classification of nested values, defaults,
//! field conversions and finally the argument builder. Exactly one
//! candidate may pass; a second success is an ambiguity and aborts the call.
//!
//! Screening failures are soft. When a leaf holds several candidates, the
//! memo is checkpointed before each one and rolled back if it fails, so a
//! half-explored candidate leaves no in-progress marks behind.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::trace;

use crate::catalogue::Catalogue;
use crate::context::UserContext;
use crate::errors::{ClassifyError, ClassifyResult, MissingShape};
use crate::shape::descriptor::Inapplicable;
use crate::shape::{Fields, ShapeDescriptor};
use crate::tree::matcher;
use crate::value::{Key, Literal, NodeId, Properties, Value};
use crate::walker::{render_path, PathSegment, Run};

/// Why one candidate did not apply
enum Rejection {
    DisallowedKey(Key),
    MissingRequiredKey(Key),
    NestedMiss { key: Key, miss: MissingShape },
    Inapplicable { key: Key, why: Inapplicable },
    NoArguments,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::DisallowedKey(key) => write!(f, "disallowed key {key}"),
            Rejection::MissingRequiredKey(key) => write!(f, "missing required key {key}"),
            Rejection::NestedMiss { key, miss } => {
                write!(f, "nested value of {key} unmatched: {}", miss.summary())
            }
            Rejection::Inapplicable { key, why } => write!(f, "field {key} not applicable: {why}"),
            Rejection::NoArguments => f.write_str("could not compute constructor arguments"),
        }
    }
}

/// The one candidate that applied, with its constructor arguments
pub(crate) struct Selection {
    pub(crate) shape: Arc<ShapeDescriptor>,
    pub(crate) arguments: Vec<Value>,
}

/// Match, evaluate and construct a typed value from a scratch copy of a bag
pub(crate) fn classify_properties(
    run: &mut Run<'_>,
    node: Option<NodeId>,
    input: Properties,
) -> ClassifyResult<Value> {
    let catalogue = run.catalogue();
    let candidates = matcher::descend(catalogue.tree(), &input, None);
    if candidates.is_empty() {
        return Err(missing_shape(run, node, input));
    }
    match evaluate(run, candidates, &input, None)? {
        Some(selection) => selection
            .shape
            .constructor()
            .construct(selection.arguments)
            .map_err(ClassifyError::Callback),
        None => Err(missing_shape(run, node, input)),
    }
}

/// Screen every candidate; `Ok(None)` when none applies
///
/// When `reasons` is given, one line per rejected candidate is appended.
pub(crate) fn evaluate(
    run: &mut Run<'_>,
    candidates: &[Arc<ShapeDescriptor>],
    input: &Properties,
    mut reasons: Option<&mut Vec<String>>,
) -> ClassifyResult<Option<Selection>> {
    let speculative = candidates.len() > 1;
    let mut selected: Option<Selection> = None;

    for shape in candidates {
        let mark = speculative.then(|| run.checkpoint());
        match screen(run, shape, input, speculative)? {
            Ok(arguments) => {
                if let Some(previous) = &selected {
                    return Err(ClassifyError::AmbiguousShapes {
                        first: previous.shape.label(),
                        second: shape.label(),
                    });
                }
                selected = Some(Selection {
                    shape: shape.clone(),
                    arguments,
                });
            }
            Err(rejection) => {
                if let Some(mark) = mark {
                    run.rollback(mark);
                }
                trace!(shape = %shape.label(), reason = %rejection, "candidate rejected");
                if let Some(reasons) = reasons.as_deref_mut() {
                    reasons.push(format!("{}: {rejection}", shape.label()));
                }
            }
        }
    }

    Ok(selected)
}

fn screen(
    run: &mut Run<'_>,
    shape: &ShapeDescriptor,
    input: &Properties,
    speculative: bool,
) -> ClassifyResult<Result<Vec<Value>, Rejection>> {
    if let Some(key) = input.keys().find(|key| shape.field(key).is_none()) {
        return Ok(Err(Rejection::DisallowedKey(key.clone())));
    }
    if let Some(key) = shape.required_keys().iter().find(|key| !input.contains_key(*key)) {
        return Ok(Err(Rejection::MissingRequiredKey(key.clone())));
    }

    let mut fields = Properties::with_capacity(shape.fields().len());
    for (key, spec) in shape.fields() {
        let value = match input.get(key) {
            Some(value) if spec.recurses() => {
                match run.classify_child(PathSegment::Key(key.clone()), value) {
                    Ok(processed) => processed,
                    Err(ClassifyError::MissingShape(miss)) if speculative => {
                        return Ok(Err(Rejection::NestedMiss {
                            key: key.clone(),
                            miss,
                        }));
                    }
                    Err(err) => return Err(err),
                }
            }
            Some(value) => value.clone(),
            None => match spec.default_value() {
                Some(default) => default.clone(),
                None => continue,
            },
        };
        fields.insert(key.clone(), value);
    }

    for key in shape.keys_needing_conversion() {
        let (Some(slot), Some(spec)) = (fields.get_mut(key), shape.field(key)) else {
            continue;
        };
        let value = std::mem::take(slot);
        match spec.convert(value, run.trusted(), run.context())? {
            Ok(converted) => *slot = converted,
            Err(why) => {
                return Ok(Err(Rejection::Inapplicable {
                    key: key.clone(),
                    why,
                }))
            }
        }
    }

    let fields = Fields::new(fields);
    let arguments = shape.build_arguments(&fields, run.trusted(), run.context())?;
    Ok(arguments.ok_or(Rejection::NoArguments))
}

/// A `MissingShape` whose details replay the evaluation only when asked for
fn missing_shape(run: &Run<'_>, node: Option<NodeId>, input: Properties) -> ClassifyError {
    let path = run.path().to_vec();
    let summary = format!("No shape matches value at {}", render_path(&path));
    let catalogue = run.catalogue().clone();
    let context = run.context().clone();
    let trusted = run.trusted();

    MissingShape::with_diagnostics(summary, move || {
        diagnose(&catalogue, &input, trusted, &context, &path, node)
    })
    .into()
}

fn diagnose(
    catalogue: &Catalogue,
    input: &Properties,
    trusted: bool,
    context: &UserContext,
    path: &[PathSegment],
    node: Option<NodeId>,
) -> String {
    let present: Vec<String> = input
        .iter()
        .map(|(key, value)| match Literal::from_value(value) {
            Some(literal) => format!("{key} = {literal}"),
            None => format!("{key}: {}", value.kind()),
        })
        .collect();

    let mut trail = Vec::new();
    let candidates = matcher::descend(catalogue.tree(), input, Some(&mut trail));
    let steps: Vec<String> = trail.iter().map(ToString::to_string).collect();

    let mut out = String::new();
    let _ = write!(out, "input: [{}]\nchecked: [{}]", present.join(", "), steps.join(", "));
    if candidates.is_empty() {
        out.push_str("\nno candidate shapes remain");
        return out;
    }

    let mut reasons = Vec::new();
    let mut replay = Run::resume(catalogue, trusted, context, path.to_vec(), node);
    if let Err(err) = evaluate(&mut replay, candidates, input, Some(&mut reasons)) {
        reasons.push(format!("replay stopped: {err}"));
    }
    for reason in reasons {
        let _ = write!(out, "\n  {reason}");
    }
    out
}
