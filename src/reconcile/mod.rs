//! Turn an optimal labeling into evolutionary events and ortholog groups.

pub mod events;
pub mod groups;

use serde::Serialize;

use crate::core::species_tree::SpeciesTree;
use crate::labeling::Labeling;
use crate::matching::layers::LayerSet;

pub use events::{LossSite, ReconciliationEvent};
pub use groups::OrthoGroup;

/// Everything inferred for one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub events: Vec<ReconciliationEvent>,
    pub groups: Vec<OrthoGroup>,
}

/// Reconcile one labeled component.
///
/// `labeling.layers` and `genes` must describe the same layers in the same
/// order.
#[must_use]
pub fn reconcile(
    tree: &SpeciesTree,
    labeling: &Labeling,
    genes: &LayerSet,
    min_group_size: usize,
) -> Reconciliation {
    Reconciliation {
        events: events::trace_events(tree, &labeling.layers, genes),
        groups: groups::ortholog_groups(tree, &labeling.layers, genes, min_group_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::{label_layers, LabelingStrategy};

    fn single_layer(tree: &SpeciesTree, names: &[Option<&str>]) -> LayerSet {
        let names: Vec<Option<String>> = names.iter().map(|g| g.map(str::to_string)).collect();
        let presence: Vec<bool> = names.iter().map(Option::is_some).collect();
        LayerSet {
            trees: vec![crate::core::layer::ParallelTree::from_presence(tree, &presence)],
            gene_names: vec![names],
        }
    }

    #[test]
    fn test_single_gene_component() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let genes = single_layer(&tree, &[None, Some("b"), None]);
        let labeling = label_layers(&tree, &genes.trees, LabelingStrategy::Auto, 5).unwrap();
        let result = reconcile(&tree, &labeling, &genes, 2);

        assert!(result.groups.is_empty());
        assert_eq!(
            result.events,
            vec![ReconciliationEvent::Birth("b".to_string())]
        );
    }

    #[test]
    fn test_conserved_family() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let genes = single_layer(&tree, &[Some("a"), Some("b"), Some("c")]);
        let labeling = label_layers(&tree, &genes.trees, LabelingStrategy::TreeCentric, 5).unwrap();
        let result = reconcile(&tree, &labeling, &genes, 2);

        assert!(result.events.is_empty());
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].len(), 3);
    }
}
