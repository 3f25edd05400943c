// Copyright 2025 Cowboy AI, LLC.

//! Serializable view of a classification tree, for tests and debugging

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tree::TreeNode;

/// Description of one tree node
///
/// Candidates are named by constructor name, so descriptions of equally
/// built catalogues compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeDescription {
    /// Candidates needing full evaluation
    Leaf {
        /// Constructor names, in catalogue order
        candidates: Vec<String>,
    },
    /// Presence test on one key
    Key {
        /// Tested key
        key: String,
        /// Key present, value not among the tracked literals
        have: Box<TreeDescription>,
        /// Key absent
        have_not: Box<TreeDescription>,
        /// Key present with a tracked literal value
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        by_value: Vec<ValueBranch>,
    },
    /// Dispatch on the first present optional key
    MayHave {
        /// One branch per optional key
        branches: Vec<KeyBranch>,
        /// None of the optional keys present
        have_none: Box<TreeDescription>,
    },
}

/// Child selected by a literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValueBranch {
    /// Literal, rendered (strings are quoted)
    pub value: String,
    /// Subtree
    pub node: TreeDescription,
}

/// Child selected by an optional key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeyBranch {
    /// Optional key
    pub key: String,
    /// Subtree
    pub node: TreeDescription,
}

impl TreeDescription {
    pub(crate) fn from_node(node: &TreeNode) -> Self {
        match node {
            TreeNode::Leaf(candidates) => TreeDescription::Leaf {
                candidates: candidates
                    .iter()
                    .map(|shape| shape.constructor().name().to_string())
                    .collect(),
            },
            TreeNode::Key(test) => TreeDescription::Key {
                key: test.key.to_string(),
                have: Box::new(Self::from_node(&test.have)),
                have_not: Box::new(Self::from_node(&test.have_not)),
                by_value: test
                    .by_value
                    .iter()
                    .map(|(literal, child)| ValueBranch {
                        value: literal.to_string(),
                        node: Self::from_node(child),
                    })
                    .collect(),
            },
            TreeNode::MayHave(test) => TreeDescription::MayHave {
                branches: test
                    .branches
                    .iter()
                    .map(|(key, child)| KeyBranch {
                        key: key.to_string(),
                        node: Self::from_node(child),
                    })
                    .collect(),
                have_none: Box::new(Self::from_node(&test.have_none)),
            },
        }
    }

    /// Convenience constructor for a leaf
    pub fn leaf<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TreeDescription::Leaf {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// JSON form
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        match self {
            TreeDescription::Leaf { .. } => 1,
            TreeDescription::Key {
                have,
                have_not,
                by_value,
                ..
            } => {
                have.leaf_count()
                    + have_not.leaf_count()
                    + by_value.iter().map(|b| b.node.leaf_count()).sum::<usize>()
            }
            TreeDescription::MayHave {
                branches,
                have_none,
            } => branches.iter().map(|b| b.node.leaf_count()).sum::<usize>() + have_none.leaf_count(),
        }
    }

    /// Largest candidate list in any leaf
    pub fn widest_leaf(&self) -> usize {
        match self {
            TreeDescription::Leaf { candidates } => candidates.len(),
            TreeDescription::Key {
                have,
                have_not,
                by_value,
                ..
            } => by_value
                .iter()
                .map(|b| b.node.widest_leaf())
                .chain([have.widest_leaf(), have_not.widest_leaf()])
                .max()
                .unwrap_or(0),
            TreeDescription::MayHave {
                branches,
                have_none,
            } => branches
                .iter()
                .map(|b| b.node.widest_leaf())
                .chain(std::iter::once(have_none.widest_leaf()))
                .max()
                .unwrap_or(0),
        }
    }
}
