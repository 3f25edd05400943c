// Copyright 2025 Cowboy AI, LLC.

//! Recursive graph walk for one classification call
//!
//! A [`Run`] owns the per-call memo. Every bag or array visited is first
//! marked in progress, then replaced by its result, so shared substructure
//! is classified once and re-entering an in-progress node is a cycle.

use std::fmt::Write as _;

use indexmap::IndexMap;
use tracing::trace;

use crate::catalogue::Catalogue;
use crate::context::UserContext;
use crate::errors::{ClassifyError, ClassifyResult};
use crate::evaluator;
use crate::value::{Array, Bag, Key, NodeId, Value};

enum Visit {
    InProgress,
    Done(Value),
}

/// Step from a parent value to a child
#[derive(Debug, Clone)]
pub(crate) enum PathSegment {
    Key(Key),
    Index(usize),
}

/// Render a path like `$.shapes[2].center`
pub(crate) fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for segment in path {
        let _ = match segment {
            PathSegment::Index(i) => write!(out, "[{i}]"),
            PathSegment::Key(Key::Str(s))
                if !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_') =>
            {
                write!(out, ".{s}")
            }
            PathSegment::Key(key) => write!(out, "[{key:?}]"),
        };
    }
    out
}

/// State of one top-level classification call
pub(crate) struct Run<'a> {
    catalogue: &'a Catalogue,
    trusted: bool,
    context: &'a UserContext,
    memo: IndexMap<NodeId, Visit>,
    path: Vec<PathSegment>,
}

impl<'a> Run<'a> {
    pub(crate) fn new(catalogue: &'a Catalogue, trusted: bool, context: &'a UserContext) -> Self {
        Self {
            catalogue,
            trusted,
            context,
            memo: IndexMap::new(),
            path: Vec::new(),
        }
    }

    /// A fresh run positioned at `path`, with `node` already in progress.
    /// Used to replay an evaluation for diagnostics.
    pub(crate) fn resume(
        catalogue: &'a Catalogue,
        trusted: bool,
        context: &'a UserContext,
        path: Vec<PathSegment>,
        node: Option<NodeId>,
    ) -> Self {
        let mut run = Self::new(catalogue, trusted, context);
        run.path = path;
        if let Some(node) = node {
            run.memo.insert(node, Visit::InProgress);
        }
        run
    }

    pub(crate) fn catalogue(&self) -> &'a Catalogue {
        self.catalogue
    }

    pub(crate) fn trusted(&self) -> bool {
        self.trusted
    }

    pub(crate) fn context(&self) -> &'a UserContext {
        self.context
    }

    pub(crate) fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Memo position to roll back to if a speculative candidate fails
    pub(crate) fn checkpoint(&self) -> usize {
        self.memo.len()
    }

    /// Forget every node first visited after `mark`
    pub(crate) fn rollback(&mut self, mark: usize) {
        self.memo.truncate(mark);
    }

    /// Classify a value; primitives and instances pass through unchanged
    pub(crate) fn classify(&mut self, value: &Value) -> ClassifyResult<Value> {
        match value {
            Value::Array(array) => self.classify_array(array),
            Value::Bag(bag) => self.classify_bag(bag),
            other => Ok(other.clone()),
        }
    }

    /// Classify a child reached through `segment`
    pub(crate) fn classify_child(&mut self, segment: PathSegment, value: &Value) -> ClassifyResult<Value> {
        if !value.is_compound() {
            return Ok(value.clone());
        }
        self.path.push(segment);
        let result = self.classify(value);
        self.path.pop();
        result
    }

    /// Returns the finished result if `node` was already classified.
    fn enter(&mut self, node: NodeId) -> ClassifyResult<Option<Value>> {
        match self.memo.get(&node) {
            Some(Visit::Done(value)) => {
                trace!(path = %render_path(&self.path), "reusing classified node");
                Ok(Some(value.clone()))
            }
            Some(Visit::InProgress) => Err(ClassifyError::CycleDetected {
                path: render_path(&self.path),
            }),
            None => {
                let limit = self.catalogue.config().max_depth;
                if self.path.len() >= limit {
                    return Err(ClassifyError::DepthExceeded {
                        limit,
                        path: render_path(&self.path),
                    });
                }
                self.memo.insert(node, Visit::InProgress);
                Ok(None)
            }
        }
    }

    fn finish(&mut self, node: NodeId, value: &Value) {
        if let Some(visit) = self.memo.get_mut(&node) {
            *visit = Visit::Done(value.clone());
        }
    }

    fn classify_array(&mut self, array: &Array) -> ClassifyResult<Value> {
        let node = array.node_id();
        if let Some(done) = self.enter(node)? {
            return Ok(done);
        }

        let (elements, extras) = array.snapshot();
        let out = Array::new();
        for (index, element) in elements.iter().enumerate() {
            out.push(self.classify_child(PathSegment::Index(index), element)?);
        }
        for (key, extra) in extras.iter().filter(|(k, _)| !k.is_reserved()) {
            let processed = self.classify_child(PathSegment::Key(key.clone()), extra)?;
            out.set_extra(key.clone(), processed);
        }

        let value = Value::Array(out);
        self.finish(node, &value);
        Ok(value)
    }

    fn classify_bag(&mut self, bag: &Bag) -> ClassifyResult<Value> {
        let node = bag.node_id();
        if let Some(done) = self.enter(node)? {
            return Ok(done);
        }

        let value = evaluator::classify_properties(self, Some(node), bag.scratch_copy())?;
        self.finish(node, &value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Symbol;

    #[test]
    fn paths_render_keys_and_indices() {
        let path = vec![
            PathSegment::Key(Key::from("shapes")),
            PathSegment::Index(2),
            PathSegment::Key(Key::from("center point")),
            PathSegment::Key(Key::from(Symbol::new("meta"))),
        ];
        assert_eq!(render_path(&path), "$.shapes[2][\"center point\"][Symbol(meta)]");
        assert_eq!(render_path(&[]), "$");
    }

    #[test]
    fn primitives_pass_through() {
        let catalogue = Catalogue::empty();
        let context = UserContext::none();
        let mut run = Run::new(&catalogue, false, &context);
        assert_eq!(run.classify(&Value::from(3)).unwrap(), Value::from(3));
        assert_eq!(run.classify(&Value::from("x")).unwrap(), Value::from("x"));
    }

    #[test]
    fn arrays_are_copied_without_reserved_extras() {
        let catalogue = Catalogue::empty();
        let context = UserContext::none();
        let mut run = Run::new(&catalogue, false, &context);
        let input = Array::from_values([1, 2]);
        input.set_extra("label", "pair");
        input.set_extra("__proto__", "forged");

        let output = run.classify(&Value::from(input.clone())).unwrap();
        let output = output.as_array().unwrap();
        assert!(!output.ptr_eq(&input));
        assert_eq!(output.elements(), input.elements());
        assert_eq!(output.extra("label"), Some(Value::from("pair")));
        assert_eq!(output.extra("__proto__"), None);
    }

    #[test]
    fn checkpoint_and_rollback_forget_later_nodes() {
        let catalogue = Catalogue::empty();
        let context = UserContext::none();
        let mut run = Run::new(&catalogue, false, &context);
        let first = Array::new();
        let second = Array::new();
        run.classify(&Value::from(first.clone())).unwrap();
        let mark = run.checkpoint();
        run.classify(&Value::from(second.clone())).unwrap();
        assert_eq!(run.checkpoint(), mark + 1);
        run.rollback(mark);
        assert_eq!(run.checkpoint(), mark);
    }
}
