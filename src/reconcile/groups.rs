use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::core::layer::LabeledTree;
use crate::core::species_tree::SpeciesTree;
use crate::matching::layers::LayerSet;

/// Genes descending from one ancestral copy without an intervening duplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrthoGroup(BTreeSet<String>);

impl OrthoGroup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for OrthoGroup {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Tab separated gene names
impl fmt::Display for OrthoGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, gene) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{gene}")?;
        }
        Ok(())
    }
}

/// Internal positions that root a maximal present subtree of one layer
fn group_roots(tree: &SpeciesTree, labeled: &LabeledTree) -> Vec<usize> {
    let mut roots = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(pos) = stack.pop() {
        let Some((left, right)) = tree.children(pos) else {
            continue;
        };
        if labeled.is_present(pos) {
            roots.push(pos);
        } else {
            stack.push(right);
            stack.push(left);
        }
    }
    roots
}

/// Ortholog groups of one component, deduplicated across layers and sorted.
///
/// Every maximal subtree whose root is labeled present contributes the genes
/// at its leaves. Empty groups and groups smaller than `min_size` are
/// dropped.
#[must_use]
pub fn ortholog_groups(
    tree: &SpeciesTree,
    labels: &[LabeledTree],
    genes: &LayerSet,
    min_size: usize,
) -> Vec<OrthoGroup> {
    let mut groups: BTreeSet<OrthoGroup> = BTreeSet::new();
    for (layer, labeled) in labels.iter().enumerate() {
        for root in group_roots(tree, labeled) {
            let group: OrthoGroup = tree
                .leaves_under(root)
                .into_iter()
                .filter_map(|species| genes.gene(layer, species).map(str::to_string))
                .collect();
            groups.insert(group);
        }
    }
    groups
        .into_iter()
        .filter(|g| !g.is_empty() && g.len() >= min_size)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layer::ParallelTree;

    fn layer_set(tree: &SpeciesTree, rows: &[&[Option<&str>]]) -> LayerSet {
        let mut set = LayerSet::default();
        for row in rows {
            let names: Vec<Option<String>> = row.iter().map(|g| g.map(str::to_string)).collect();
            let presence: Vec<bool> = names.iter().map(Option::is_some).collect();
            set.trees.push(ParallelTree::from_presence(tree, &presence));
            set.gene_names.push(names);
        }
        set
    }

    fn labels(texts: &[&str]) -> Vec<LabeledTree> {
        texts.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn as_strings(groups: &[OrthoGroup]) -> Vec<String> {
        groups.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_whole_tree_group() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let genes = layer_set(&tree, &[&[Some("a"), Some("b"), Some("c")]]);
        let groups = ortholog_groups(&tree, &labels(&["11111"]), &genes, 2);
        assert_eq!(as_strings(&groups), vec!["a\tb\tc"]);
    }

    #[test]
    fn test_absent_root_splits_groups() {
        // ((A,B),(C,D)) born twice, once in each clade
        let tree = SpeciesTree::from_postfix("11N11NN").unwrap();
        let genes = layer_set(&tree, &[&[Some("a"), Some("b"), Some("c"), Some("d")]]);
        let groups = ortholog_groups(&tree, &labels(&["1111110"]), &genes, 2);
        assert_eq!(as_strings(&groups), vec!["a\tb", "c\td"]);
    }

    #[test]
    fn test_lost_species_are_left_out() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let genes = layer_set(&tree, &[&[Some("a"), None, Some("c")]]);
        let groups = ortholog_groups(&tree, &labels(&["10111"]), &genes, 2);
        assert_eq!(as_strings(&groups), vec!["a\tc"]);
    }

    #[test]
    fn test_singletons_dropped_and_duplicates_merged() {
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        let genes = layer_set(
            &tree,
            &[&[Some("a"), Some("b")], &[Some("a"), Some("b")], &[Some("x"), None]],
        );
        let groups = ortholog_groups(&tree, &labels(&["111", "111", "100"]), &genes, 2);
        assert_eq!(as_strings(&groups), vec!["a\tb"]);
    }

    #[test]
    fn test_present_subtree_without_genes_is_not_a_group() {
        // Inner node labeled present but no gene at its leaves in this layer
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let genes = layer_set(&tree, &[&[None, None, Some("c")]]);
        let groups = ortholog_groups(&tree, &labels(&["00100"]), &genes, 0);
        assert!(groups.is_empty(), "{:?}", as_strings(&groups));
    }

    #[test]
    fn test_leaf_root_has_no_group() {
        let tree = SpeciesTree::from_postfix("1").unwrap();
        let genes = layer_set(&tree, &[&[Some("a")]]);
        assert!(ortholog_groups(&tree, &labels(&["1"]), &genes, 1).is_empty());
    }
}
