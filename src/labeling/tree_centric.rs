//! Layer-at-a-time labeling over accumulated presence.
//!
//! Each layer's valid internal labelings are enumerated independently, keeping
//! the cheapest cost per distinct [`LabelKey`]. Layers are then folded left to
//! right over the union of their labels, and the validity constraints are only
//! checked once on the final union.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::layer::{LabeledTree, ParallelTree};
use crate::core::species_tree::{SpeciesTree, Token};
use crate::labeling::constraints::{is_valid, union_leaves};
use crate::labeling::keys::LabelKey;
use crate::labeling::{check_layers, Labeler, Labeling, LabelingError};

// Per-node values during the reduction
const NOTHING: u8 = 0;
const PRESENT: u8 = 1;
/// Absent at this node, present somewhere below
const ABSENT: u8 = 2;

/// A partially reduced layer: open subtrees, bits assigned so far, cost
#[derive(Debug, Clone)]
struct Partial {
    stack: Vec<u8>,
    key: LabelKey,
    cost: usize,
}

/// Cheapest way to reach an accumulated union after some number of layers
#[derive(Debug, Clone)]
struct Step {
    cost: usize,
    label: LabelKey,
    previous: LabelKey,
}

/// Tree-centric labeler
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeCentricSolver;

impl TreeCentricSolver {
    /// Every valid internal labeling of one layer with its minimum cost.
    ///
    /// The postfix reduction branches at each node whose children disagree;
    /// the parent is either present (a loss below) or absent (a birth below),
    /// both at cost one.
    #[must_use]
    pub fn valid_labelings(tree: &SpeciesTree, layer: &ParallelTree) -> BTreeMap<LabelKey, usize> {
        let mut partials = vec![Partial {
            stack: Vec::with_capacity(tree.species_count()),
            key: LabelKey::zeros(tree.internal_count()),
            cost: 0,
        }];

        for (pos, token) in tree.tokens().iter().enumerate() {
            match *token {
                Token::Leaf { .. } => {
                    let value = if layer.is_present(pos) { PRESENT } else { NOTHING };
                    for partial in &mut partials {
                        partial.stack.push(value);
                    }
                }
                Token::Internal { ordinal } => {
                    let mut next = Vec::with_capacity(partials.len());
                    for mut partial in partials {
                        let (Some(right), Some(left)) = (partial.stack.pop(), partial.stack.pop())
                        else {
                            continue;
                        };
                        match (left, right) {
                            (NOTHING, NOTHING) => {
                                partial.stack.push(NOTHING);
                                next.push(partial);
                            }
                            (PRESENT, PRESENT) => {
                                partial.stack.push(PRESENT);
                                partial.key.set(ordinal, true);
                                next.push(partial);
                            }
                            (NOTHING, PRESENT) | (PRESENT, NOTHING) => {
                                let mut lost = partial.clone();
                                lost.stack.push(PRESENT);
                                lost.key.set(ordinal, true);
                                lost.cost += 1;
                                next.push(lost);

                                partial.stack.push(ABSENT);
                                partial.cost += 1;
                                next.push(partial);
                            }
                            _ => {
                                partial.stack.push(ABSENT);
                                partial.cost += usize::from((left | right) & 1);
                                next.push(partial);
                            }
                        }
                    }
                    partials = next;
                }
            }
        }

        let mut labelings: BTreeMap<LabelKey, usize> = BTreeMap::new();
        for partial in partials {
            labelings
                .entry(partial.key)
                .and_modify(|cost| *cost = (*cost).min(partial.cost))
                .or_insert(partial.cost);
        }
        labelings
    }
}

impl Labeler for TreeCentricSolver {
    fn name(&self) -> &'static str {
        "tree-centric"
    }

    fn label(
        &self,
        tree: &SpeciesTree,
        layers: &[ParallelTree],
    ) -> Result<Labeling, LabelingError> {
        check_layers(tree, layers)?;
        let n = layers.len();
        if n == 0 {
            return Ok(Labeling::default());
        }
        let width = tree.internal_count();

        let start = LabelKey::zeros(width);
        let mut frontier: BTreeMap<LabelKey, usize> = BTreeMap::new();
        frontier.insert(start, 0);
        let mut steps: Vec<BTreeMap<LabelKey, Step>> = Vec::with_capacity(n);

        for (index, layer) in layers.iter().enumerate() {
            let candidates = Self::valid_labelings(tree, layer);
            debug!("Layer {index}: {} candidate labelings", candidates.len());

            let mut table: BTreeMap<LabelKey, Step> = BTreeMap::new();
            for (union, &base) in &frontier {
                for (label, &cost) in &candidates {
                    let Some(next) = union.union(label) else {
                        return Err(LabelingError::KeySizeMismatch {
                            expected: width,
                            found: label.len(),
                            layers: n,
                        });
                    };
                    let cost = base + cost;
                    match table.get(&next) {
                        Some(step) if step.cost <= cost => {}
                        _ => {
                            table.insert(
                                next,
                                Step {
                                    cost,
                                    label: label.clone(),
                                    previous: union.clone(),
                                },
                            );
                        }
                    }
                }
            }
            frontier = table.iter().map(|(key, step)| (key.clone(), step.cost)).collect();
            steps.push(table);
        }

        let leaves = union_leaves(tree, layers);
        let best = frontier
            .iter()
            .filter(|(key, _)| is_valid(tree, &leaves, key))
            .min_by_key(|(_, &cost)| cost);
        let Some((final_key, &total)) = best else {
            return Err(LabelingError::Infeasible { layers: n });
        };

        let mut chosen: Vec<LabelKey> = Vec::with_capacity(n);
        let mut key = final_key.clone();
        for table in steps.iter().rev() {
            let Some(step) = table.get(&key) else {
                return Err(LabelingError::Infeasible { layers: n });
            };
            chosen.push(step.label.clone());
            key = step.previous.clone();
        }
        chosen.reverse();

        let labeled = layers
            .iter()
            .zip(&chosen)
            .map(|(layer, label)| {
                let labels = tree
                    .tokens()
                    .iter()
                    .enumerate()
                    .map(|(pos, token)| match *token {
                        Token::Leaf { .. } => layer.is_present(pos),
                        Token::Internal { ordinal } => label.get(ordinal),
                    })
                    .collect();
                LabeledTree::new(labels)
            })
            .collect();

        Ok(Labeling {
            total_substitutions: total,
            layers: labeled,
        })
    }
}
