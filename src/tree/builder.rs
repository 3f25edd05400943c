// Copyright 2025 Cowboy AI, LLC.

//! Entropy-driven construction of classification trees
//!
//! With `N` equally likely candidates the entropy before a split is
//! `log2(N)`. A split into partitions `p` (which may overlap, since optional
//! and unconstrained shapes can sit in several) leaves
//! `sum(|p| / T * log2|p|)` with `T = sum(|p|)`. The key with the largest
//! reduction wins; ties go to the key observed first.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::shape::ShapeDescriptor;
use crate::tree::{Candidates, ClassificationTree, KeyTest, MayHaveTest, TreeNode};
use crate::value::{Key, Literal};

/// Build the tree for `shapes`, in catalogue order
pub(crate) fn build_tree(shapes: &[Arc<ShapeDescriptor>], config: &ClassifierConfig) -> ClassificationTree {
    let keys: IndexSet<Key> = shapes
        .iter()
        .flat_map(|shape| shape.fields().keys().cloned())
        .collect();
    let root = build_node(shapes.to_vec(), &keys, config.may_have_dispatch);
    debug!(shapes = shapes.len(), keys = keys.len(), "built classification tree");
    ClassificationTree::new(root)
}

fn build_node(candidates: Candidates, keys: &IndexSet<Key>, may_have: bool) -> TreeNode {
    let n = candidates.len();
    if n <= 1 {
        return TreeNode::Leaf(candidates);
    }
    let before = (n as f64).log2();

    let mut best: Option<(f64, KeyPartition)> = None;
    for key in keys {
        let partition = KeyPartition::split(&candidates, key);
        if !partition.discriminates(n) {
            continue;
        }
        let gain = before - entropy(partition.sizes());
        if gain > best.as_ref().map_or(0.0, |(g, _)| *g) {
            best = Some((gain, partition));
        }
    }

    if let Some((gain, partition)) = best {
        debug!(key = %partition.key, gain, candidates = n, "split on key");
        let remaining = without(keys, std::iter::once(&partition.key));
        return TreeNode::Key(partition.into_test(&remaining, may_have));
    }

    if may_have {
        if let Some(partition) = MayHavePartition::split(&candidates, keys) {
            let after = entropy(partition.sizes());
            if after < before {
                debug!(
                    keys = partition.branches.len(),
                    gain = before - after,
                    candidates = n,
                    "may-have dispatch"
                );
                let remaining = without(keys, partition.branches.keys());
                return TreeNode::MayHave(partition.into_test(&remaining, may_have));
            }
        }
    }

    debug!(candidates = n, "leaf requires linear evaluation");
    TreeNode::Leaf(candidates)
}

/// Weighted mean of `log2(size)` over the partitions
fn entropy(sizes: impl Iterator<Item = usize> + Clone) -> f64 {
    let total: usize = sizes.clone().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    sizes
        .filter(|&s| s > 0)
        .map(|s| {
            let s = s as f64;
            s / total * s.log2()
        })
        .sum()
}

fn without<'k>(keys: &IndexSet<Key>, removed: impl Iterator<Item = &'k Key>) -> IndexSet<Key> {
    let mut remaining = keys.clone();
    for key in removed {
        remaining.shift_remove(key);
    }
    remaining
}

struct KeyPartition {
    key: Key,
    have: Candidates,
    have_not: Candidates,
    by_value: IndexMap<Literal, Candidates>,
}

impl KeyPartition {
    fn split(candidates: &[Arc<ShapeDescriptor>], key: &Key) -> Self {
        let mut have = Vec::new();
        let mut have_not = Vec::new();
        let mut literals: IndexSet<Literal> = IndexSet::new();

        for shape in candidates {
            match shape.field(key) {
                None => have_not.push(shape.clone()),
                Some(spec) => {
                    if !spec.is_required() {
                        have_not.push(shape.clone());
                    }
                    match spec.literal() {
                        Some(literal) => {
                            literals.insert(literal.clone());
                        }
                        None => have.push(shape.clone()),
                    }
                }
            }
        }

        // each value partition keeps the unconstrained shapes, in input order
        let by_value = literals
            .into_iter()
            .map(|literal| {
                let members = candidates
                    .iter()
                    .filter(|shape| {
                        shape
                            .field(key)
                            .is_some_and(|spec| spec.literal().map_or(true, |l| *l == literal))
                    })
                    .cloned()
                    .collect();
                (literal, members)
            })
            .collect();

        Self {
            key: key.clone(),
            have,
            have_not,
            by_value,
        }
    }

    fn sizes(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        [self.have_not.len(), self.have.len()]
            .into_iter()
            .chain(self.by_value.values().map(Vec::len))
    }

    /// Every partition must be strictly smaller than the current list.
    fn discriminates(&self, n: usize) -> bool {
        self.sizes().all(|s| s < n)
    }

    fn into_test(self, remaining: &IndexSet<Key>, may_have: bool) -> KeyTest {
        KeyTest {
            key: self.key,
            have: Box::new(build_node(self.have, remaining, may_have)),
            have_not: Box::new(build_node(self.have_not, remaining, may_have)),
            by_value: self
                .by_value
                .into_iter()
                .map(|(literal, members)| (literal, build_node(members, remaining, may_have)))
                .collect(),
        }
    }
}

struct MayHavePartition {
    branches: IndexMap<Key, Candidates>,
    have_none: Candidates,
}

impl MayHavePartition {
    /// Qualifying keys are declared by at least one and at most half of the candidates.
    fn split(candidates: &[Arc<ShapeDescriptor>], keys: &IndexSet<Key>) -> Option<Self> {
        let n = candidates.len();
        let qualifying: Vec<&Key> = keys
            .iter()
            .filter(|key| {
                let declared = candidates.iter().filter(|s| s.field(key).is_some()).count();
                declared > 0 && declared * 2 <= n
            })
            .collect();
        if qualifying.is_empty() {
            return None;
        }

        let branches = qualifying
            .iter()
            .map(|&key| {
                let members = candidates
                    .iter()
                    .filter(|s| s.field(key).is_some())
                    .cloned()
                    .collect();
                (key.clone(), members)
            })
            .collect();
        let have_none = candidates
            .iter()
            .filter(|s| {
                !qualifying
                    .iter()
                    .any(|&key| s.field(key).is_some_and(|spec| spec.is_required()))
            })
            .cloned()
            .collect();

        Some(Self {
            branches,
            have_none,
        })
    }

    fn sizes(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        self.branches
            .values()
            .map(Vec::len)
            .chain(std::iter::once(self.have_none.len()))
    }

    fn into_test(self, remaining: &IndexSet<Key>, may_have: bool) -> MayHaveTest {
        MayHaveTest {
            branches: self
                .branches
                .into_iter()
                .map(|(key, members)| (key, build_node(members, remaining, may_have)))
                .collect(),
            have_none: Box::new(build_node(self.have_none, remaining, may_have)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_even_split() {
        let sizes = [2usize, 2];
        assert!((entropy(sizes.into_iter()) - 1.0).abs() < 1e-12);
        assert_eq!(entropy([1usize, 1, 1].into_iter()), 0.0);
        assert_eq!(entropy([0usize, 0].into_iter()), 0.0);
    }

    #[test]
    fn without_preserves_order() {
        let keys: IndexSet<Key> = ["a", "b", "c"].into_iter().map(Key::from).collect();
        let b = Key::from("b");
        let rest = without(&keys, std::iter::once(&b));
        assert_eq!(rest.iter().map(|k| k.to_string()).collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
