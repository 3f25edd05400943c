// Copyright 2025 Cowboy AI, LLC.

//! Duck hunt: walk a classification tree down to a candidate leaf

use std::fmt;
use std::sync::Arc;

use crate::shape::ShapeDescriptor;
use crate::tree::{ClassificationTree, TreeNode};
use crate::value::{Key, Literal, Properties};

/// One decision taken while descending, kept for diagnostics
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Absent(Key),
    Present(Key),
    Valued(Key, Literal),
    MayHave(Key),
    HaveNone(Vec<Key>),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Absent(key) => write!(f, "{key} absent"),
            Step::Present(key) => write!(f, "{key} present"),
            Step::Valued(key, literal) => write!(f, "{key} = {literal}"),
            Step::MayHave(key) => write!(f, "has optional {key}"),
            Step::HaveNone(keys) => {
                let names: Vec<String> = keys.iter().map(ToString::to_string).collect();
                write!(f, "has none of [{}]", names.join(", "))
            }
        }
    }
}

/// Candidates that could apply to `input`
///
/// An empty slice means no shape can match. When `trail` is given, every
/// decision is recorded in it.
pub(crate) fn descend<'t>(
    tree: &'t ClassificationTree,
    input: &Properties,
    mut trail: Option<&mut Vec<Step>>,
) -> &'t [Arc<ShapeDescriptor>] {
    let mut record = |step: Step| {
        if let Some(trail) = trail.as_deref_mut() {
            trail.push(step);
        }
    };

    let mut node = tree.root();
    loop {
        node = match node {
            TreeNode::Leaf(candidates) => return candidates,
            TreeNode::Key(test) => match input.get(&test.key) {
                None => {
                    record(Step::Absent(test.key.clone()));
                    test.have_not.as_ref()
                }
                Some(value) => {
                    let valued = Literal::from_value(value)
                        .and_then(|literal| test.by_value.get_key_value(&literal));
                    match valued {
                        Some((literal, child)) => {
                            record(Step::Valued(test.key.clone(), literal.clone()));
                            child
                        }
                        None => {
                            record(Step::Present(test.key.clone()));
                            test.have.as_ref()
                        }
                    }
                }
            },
            TreeNode::MayHave(test) => {
                let hit = input
                    .keys()
                    .find_map(|key| test.branches.get_key_value(key));
                match hit {
                    Some((key, child)) => {
                        record(Step::MayHave(key.clone()));
                        child
                    }
                    None => {
                        record(Step::HaveNone(test.branches.keys().cloned().collect()));
                        test.have_none.as_ref()
                    }
                }
            }
        };
    }
}
