use std::fmt;

use serde::Serialize;

use crate::core::layer::LabeledTree;
use crate::core::species_tree::{SpeciesTree, Token};
use crate::matching::layers::LayerSet;

/// Where a gene copy was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LossSite {
    /// An extant species, by species index
    Species(usize),
    /// An ancestral clade, by internal-node ordinal
    Ancestor(usize),
}

impl LossSite {
    /// The loss site for a species-tree position
    #[must_use]
    pub fn at(tree: &SpeciesTree, position: usize) -> Self {
        match tree.token(position) {
            Token::Leaf { species } => Self::Species(species),
            Token::Internal { ordinal } => Self::Ancestor(ordinal),
        }
    }
}

impl fmt::Display for LossSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Species(k) => write!(f, "Species{k}"),
            Self::Ancestor(k) => write!(f, "Ancestor{k}"),
        }
    }
}

/// One inferred event on a labeled layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationEvent {
    /// First appearance of the family at this clade
    Birth(String),
    /// A new copy next to an existing one
    Duplication(String),
    Loss(LossSite),
}

/// Open subtree during the postfix walk
struct Open {
    position: usize,
    gene: Option<String>,
}

/// Classify the label changes of every layer into events.
///
/// A present child under an absent parent is a birth the first time any
/// layer does so at that clade, and a duplication afterwards. An absent child
/// under a present parent is a loss at that child. Internal nodes carry the
/// gene of their first present child, left before right, so changes higher
/// up are still attributed to a gene.
#[must_use]
pub fn trace_events(
    tree: &SpeciesTree,
    labels: &[LabeledTree],
    genes: &LayerSet,
) -> Vec<ReconciliationEvent> {
    let mut union: Vec<bool> = (0..tree.len())
        .map(|pos| labels.iter().any(|layer| layer.is_present(pos)))
        .collect();
    let mut events = Vec::new();

    for (layer, labeled) in labels.iter().enumerate() {
        let mut stack: Vec<Open> = Vec::with_capacity(tree.species_count());
        for (position, token) in tree.tokens().iter().enumerate() {
            let gene = match *token {
                Token::Leaf { species } => genes.gene(layer, species).map(str::to_string),
                Token::Internal { .. } => {
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        break;
                    };
                    let parent = labeled.is_present(position);
                    let left_present = labeled.is_present(left.position);
                    let right_present = labeled.is_present(right.position);

                    let (present, absent) = match (left_present, right_present) {
                        (true, false) => (left, right),
                        (false, true) => (right, left),
                        (true, true) => {
                            stack.push(Open {
                                position,
                                gene: if parent { left.gene.or(right.gene) } else { None },
                            });
                            continue;
                        }
                        (false, false) => {
                            stack.push(Open {
                                position,
                                gene: None,
                            });
                            continue;
                        }
                    };

                    if parent {
                        events.push(ReconciliationEvent::Loss(LossSite::at(
                            tree,
                            absent.position,
                        )));
                        present.gene
                    } else {
                        if let Some(gene) = present.gene {
                            if union[position] {
                                events.push(ReconciliationEvent::Duplication(gene));
                            } else {
                                events.push(ReconciliationEvent::Birth(gene));
                            }
                        }
                        union[position] = true;
                        None
                    }
                }
            };
            stack.push(Open { position, gene });
        }
    }
    events
}
