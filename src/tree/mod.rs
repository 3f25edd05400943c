// Copyright 2025 Cowboy AI, LLC.

//! Classification trees
//!
//! A catalogue's shapes are arranged into a decision tree once, on first
//! use. Internal nodes test the input for a key (optionally splitting on
//! the key's literal value) or for any of several rarely-declared keys;
//! leaves hold the few candidates that still need full evaluation.

pub(crate) mod builder;
pub mod describe;
pub(crate) mod matcher;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::shape::ShapeDescriptor;
use crate::value::{Key, Literal};

pub use describe::{KeyBranch, TreeDescription, ValueBranch};

pub(crate) type Candidates = Vec<Arc<ShapeDescriptor>>;

pub(crate) enum TreeNode {
    Leaf(Candidates),
    Key(KeyTest),
    MayHave(MayHaveTest),
}

/// Presence test on one key, with optional literal-value children
pub(crate) struct KeyTest {
    pub(crate) key: Key,
    pub(crate) have: Box<TreeNode>,
    pub(crate) have_not: Box<TreeNode>,
    pub(crate) by_value: IndexMap<Literal, TreeNode>,
}

/// Dispatch on the first input key found among rarely-declared keys
pub(crate) struct MayHaveTest {
    pub(crate) branches: IndexMap<Key, TreeNode>,
    pub(crate) have_none: Box<TreeNode>,
}

/// Precomputed decision structure for one catalogue
pub struct ClassificationTree {
    root: TreeNode,
}

impl ClassificationTree {
    pub(crate) fn new(root: TreeNode) -> Self {
        Self { root }
    }

    pub(crate) fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Serializable description of the tree
    pub fn describe(&self) -> TreeDescription {
        TreeDescription::from_node(&self.root)
    }
}

impl std::fmt::Debug for ClassificationTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationTree")
            .field("root", &self.describe())
            .finish()
    }
}
