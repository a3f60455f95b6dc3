//! Biological validity of an accumulated (union) labeling.
//!
//! Both checks walk the species tree bottom-up over a ternary state per node:
//! `0` nothing below, `1` present, `2` absent but something below.

use crate::core::layer::ParallelTree;
use crate::core::species_tree::{SpeciesTree, Token};
use crate::labeling::keys::LabelKey;

const NOTHING: u8 = 0;
const PRESENT: u8 = 1;
const MIXED: u8 = 2;

/// Per-position union of leaf presence across all layers
#[must_use]
pub fn union_leaves(tree: &SpeciesTree, layers: &[ParallelTree]) -> Vec<bool> {
    (0..tree.len())
        .map(|pos| tree.is_leaf(pos) && layers.iter().any(|layer| layer.is_present(pos)))
        .collect()
}

/// A node whose subtree is mixed must not have a parent labeled present.
#[must_use]
pub fn no_reappearance(tree: &SpeciesTree, leaves: &[bool], union: &LabelKey) -> bool {
    let mut stack: Vec<u8> = Vec::with_capacity(tree.len());
    for (pos, token) in tree.tokens().iter().enumerate() {
        match *token {
            Token::Leaf { .. } => stack.push(if leaves[pos] { PRESENT } else { NOTHING }),
            Token::Internal { ordinal } => {
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return false;
                };
                if union.get(ordinal) {
                    if left == MIXED || right == MIXED {
                        return false;
                    }
                    stack.push(PRESENT);
                } else if left == NOTHING && right == NOTHING {
                    stack.push(NOTHING);
                } else {
                    stack.push(MIXED);
                }
            }
        }
    }
    true
}

/// A node labeled absent needs at least one child subtree with nothing in it.
#[must_use]
pub fn zero_one(tree: &SpeciesTree, leaves: &[bool], union: &LabelKey) -> bool {
    let mut stack: Vec<bool> = Vec::with_capacity(tree.len());
    for (pos, token) in tree.tokens().iter().enumerate() {
        match *token {
            Token::Leaf { .. } => stack.push(leaves[pos]),
            Token::Internal { ordinal } => {
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return false;
                };
                if union.get(ordinal) {
                    stack.push(true);
                } else if left && right {
                    return false;
                } else {
                    stack.push(left || right);
                }
            }
        }
    }
    true
}

/// Both constraints hold
#[must_use]
pub fn is_valid(tree: &SpeciesTree, leaves: &[bool], union: &LabelKey) -> bool {
    zero_one(tree, leaves, union) && no_reappearance(tree, leaves, union)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(bits: &[bool]) -> LabelKey {
        let mut key = LabelKey::zeros(bits.len());
        for (i, &bit) in bits.iter().enumerate() {
            key.set(i, bit);
        }
        key
    }

    #[test]
    fn test_union_leaves() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let layers: Vec<ParallelTree> = vec!["10N0N".parse().unwrap(), "00N1N".parse().unwrap()];
        assert_eq!(
            union_leaves(&tree, &layers),
            vec![true, false, false, true, false]
        );
    }

    #[test]
    fn test_reappearance_rejected() {
        // ((A,B),C) with A and C present: inner node absent, root present
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let leaves = [true, false, false, true, false];
        assert!(!no_reappearance(&tree, &leaves, &key(&[false, true])));
        assert!(no_reappearance(&tree, &leaves, &key(&[true, true])));
        assert!(no_reappearance(&tree, &leaves, &key(&[false, false])));
    }

    #[test]
    fn test_zero_one() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let leaves = [true, true, false, false, false];
        // Inner node absent with both children occupied
        assert!(!zero_one(&tree, &leaves, &key(&[false, false])));
        assert!(zero_one(&tree, &leaves, &key(&[true, false])));
        assert!(is_valid(&tree, &leaves, &key(&[true, false])));
    }
}
