//! Minimum-substitution labeling of internal species-tree nodes.
//!
//! Two interchangeable strategies implement [`Labeler`]:
//!
//! - [`node_centric::NodeCentricSolver`]: joint state of all layers per node,
//!   exact and fast for a few layers
//! - [`tree_centric::TreeCentricSolver`]: enumerates each layer on its own
//!   and folds layers over their accumulated presence
//!
//! Both minimize the same objective under the same constraints, so for any
//! input they return the same total substitution count.

pub mod constraints;
pub mod keys;
pub mod node_centric;
pub mod tree_centric;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::layer::{LabeledTree, ParallelTree};
use crate::core::species_tree::SpeciesTree;

pub use node_centric::NodeCentricSolver;
pub use tree_centric::TreeCentricSolver;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelingError {
    #[error("Key holds {found} slots, expected {expected} ({layers} layers)")]
    KeySizeMismatch {
        expected: usize,
        found: usize,
        layers: usize,
    },

    #[error("Layer {layer} does not match the species tree shape")]
    ShapeMismatch { layer: usize },

    #[error("No labeling of {layers} layers satisfies the validity constraints")]
    Infeasible { layers: usize },
}

/// Optimal labeling of every layer of one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Labeling {
    pub total_substitutions: usize,
    pub layers: Vec<LabeledTree>,
}

/// A strategy that labels the internal nodes of every layer
pub trait Labeler {
    fn name(&self) -> &'static str;

    /// Label `layers` against `tree`.
    ///
    /// # Errors
    ///
    /// Returns `LabelingError::ShapeMismatch` if a layer does not fit the
    /// tree, or `LabelingError::Infeasible` if no valid labeling exists.
    fn label(&self, tree: &SpeciesTree, layers: &[ParallelTree])
        -> Result<Labeling, LabelingError>;
}

/// Which labeler to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelingStrategy {
    /// Node-centric below the layer threshold, tree-centric otherwise
    #[default]
    Auto,
    NodeCentric,
    TreeCentric,
}

impl LabelingStrategy {
    /// Resolve `Auto` against the number of layers
    #[must_use]
    pub fn resolve(self, layers: usize, node_centric_max_layers: usize) -> Self {
        match self {
            LabelingStrategy::Auto if layers < node_centric_max_layers => {
                LabelingStrategy::NodeCentric
            }
            LabelingStrategy::Auto => LabelingStrategy::TreeCentric,
            other => other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LabelingStrategy::Auto => "auto",
            LabelingStrategy::NodeCentric => NodeCentricSolver.name(),
            LabelingStrategy::TreeCentric => TreeCentricSolver.name(),
        }
    }
}

/// Label `layers` with the chosen strategy.
///
/// # Errors
///
/// Propagates the selected labeler's errors.
pub fn label_layers(
    tree: &SpeciesTree,
    layers: &[ParallelTree],
    strategy: LabelingStrategy,
    node_centric_max_layers: usize,
) -> Result<Labeling, LabelingError> {
    let labeler: &dyn Labeler = match strategy.resolve(layers.len(), node_centric_max_layers) {
        LabelingStrategy::TreeCentric => &TreeCentricSolver,
        _ => &NodeCentricSolver,
    };
    debug!("Labeling {} layers with {}", layers.len(), labeler.name());
    labeler.label(tree, layers)
}

/// Every layer must line up with the species tree
pub(crate) fn check_layers(
    tree: &SpeciesTree,
    layers: &[ParallelTree],
) -> Result<(), LabelingError> {
    match layers.iter().position(|layer| !layer.fits(tree)) {
        Some(layer) => Err(LabelingError::ShapeMismatch { layer }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(patterns: &[&str]) -> Vec<ParallelTree> {
        patterns.iter().map(|p| p.parse().unwrap()).collect()
    }

    /// Every leaf pattern of one layer over `tree`
    fn all_patterns(tree: &SpeciesTree) -> Vec<ParallelTree> {
        let species = tree.species_count();
        (0..1u32 << species)
            .map(|mask| {
                let presence: Vec<bool> = (0..species).map(|s| (mask >> s) & 1 == 1).collect();
                ParallelTree::from_presence(tree, &presence)
            })
            .collect()
    }

    #[test]
    fn test_strategy_resolution() {
        assert_eq!(
            LabelingStrategy::Auto.resolve(4, 5),
            LabelingStrategy::NodeCentric
        );
        assert_eq!(
            LabelingStrategy::Auto.resolve(5, 5),
            LabelingStrategy::TreeCentric
        );
        assert_eq!(
            LabelingStrategy::NodeCentric.resolve(50, 5),
            LabelingStrategy::NodeCentric
        );
        assert_eq!(LabelingStrategy::TreeCentric.as_str(), "tree-centric");
    }

    #[test]
    fn test_solvers_agree_on_every_pair_of_layers() {
        for text in ["11N1N", "11N11NN"] {
            let tree = SpeciesTree::from_postfix(text).unwrap();
            let patterns = all_patterns(&tree);
            for a in &patterns {
                for b in &patterns {
                    let input = vec![a.clone(), b.clone()];
                    let node = NodeCentricSolver.label(&tree, &input);
                    let treec = TreeCentricSolver.label(&tree, &input);
                    match (node, treec) {
                        (Ok(node), Ok(treec)) => {
                            assert_eq!(
                                node.total_substitutions, treec.total_substitutions,
                                "{a} {b}"
                            );
                        }
                        (Err(node), Err(treec)) => assert_eq!(node, treec, "{a} {b}"),
                        (node, treec) => panic!("{a} {b}: {node:?} vs {treec:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_solvers_agree_on_three_layers() {
        let tree = SpeciesTree::from_postfix("11N1N11NN").unwrap();
        let input = layers(&["10N1N01NN", "11N0N00NN", "00N1N11NN"]);
        let node = NodeCentricSolver.label(&tree, &input).unwrap();
        let treec = TreeCentricSolver.label(&tree, &input).unwrap();
        assert_eq!(node.total_substitutions, treec.total_substitutions);
        for labeling in [&node, &treec] {
            let recount: usize = labeling
                .layers
                .iter()
                .map(|layer| layer.substitutions(&tree))
                .sum();
            assert_eq!(recount, labeling.total_substitutions);
        }
    }

    #[test]
    fn test_label_layers_dispatch() {
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        let input = layers(&["11N"]);
        let auto = label_layers(&tree, &input, LabelingStrategy::Auto, 5).unwrap();
        let forced = label_layers(&tree, &input, LabelingStrategy::TreeCentric, 5).unwrap();
        assert_eq!(auto, forced);
        assert_eq!(auto.layers[0].to_string(), "111");
    }

    #[test]
    fn test_check_layers() {
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        assert!(check_layers(&tree, &layers(&["10N", "01N"])).is_ok());
        assert_eq!(
            check_layers(&tree, &layers(&["10N", "0N1"])),
            Err(LabelingError::ShapeMismatch { layer: 1 })
        );
    }
}
