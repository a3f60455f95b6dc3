use thiserror::Error;
use tracing::{debug, warn};

use crate::core::layer::ParallelTree;
use crate::core::orthology::OrthologyGraph;
use crate::core::species_tree::{SpeciesTree, Token};
use crate::matching::hungarian::{max_weight_matching, CostMatrix, MatchError};
use crate::utils::validation::check_gene_limit;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("Gene '{gene}' belongs to species {species} but the species tree has {species_count} species")]
    SpeciesOutOfRange {
        gene: String,
        species: usize,
        species_count: usize,
    },

    #[error("{0}")]
    TooManyGenes(String),

    #[error("Ortholog scores cannot be matched: {0}")]
    Matching(#[from] MatchError),
}

/// Genes stacked into one layer, at most one per species
type Layer = Vec<String>;

/// The parallel trees of one component plus the gene occupying each slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSet {
    pub trees: Vec<ParallelTree>,
    /// `gene_names[layer][species]`
    pub gene_names: Vec<Vec<Option<String>>>,
}

impl LayerSet {
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    #[must_use]
    pub fn gene(&self, layer: usize, species: usize) -> Option<&str> {
        self.gene_names.get(layer)?.get(species)?.as_deref()
    }
}

/// Folds the species tree bottom-up, pairing the layers of sibling subtrees
/// by maximum total similarity.
pub struct LayerMerger<'a> {
    tree: &'a SpeciesTree,
    graph: &'a OrthologyGraph,
}

impl<'a> LayerMerger<'a> {
    #[must_use]
    pub fn new(tree: &'a SpeciesTree, graph: &'a OrthologyGraph) -> Self {
        Self { tree, graph }
    }

    /// Split one connected component into parallel layers.
    ///
    /// Genes absent from the species map are skipped with a warning. The
    /// number of layers equals the largest per-species gene count.
    ///
    /// # Errors
    ///
    /// Returns `LayerError::SpeciesOutOfRange` if a gene's species index is
    /// not a leaf of the species tree, `LayerError::TooManyGenes` if the
    /// component exceeds the gene limit, or `LayerError::Matching` if the
    /// summed scores between two layers overflow the matching weights.
    pub fn merge(&self, genes: &[String]) -> Result<LayerSet, LayerError> {
        if let Some(msg) = check_gene_limit(genes.len()) {
            return Err(LayerError::TooManyGenes(msg));
        }
        let species_count = self.tree.species_count();
        let mut buckets: Vec<Vec<Layer>> = vec![Vec::new(); species_count];

        for gene in genes {
            let Some(species) = self.graph.species_of(gene) else {
                warn!("Skipping gene '{gene}': not present in the species map");
                continue;
            };
            if species >= species_count {
                return Err(LayerError::SpeciesOutOfRange {
                    gene: gene.clone(),
                    species,
                    species_count,
                });
            }
            buckets[species].push(vec![gene.clone()]);
        }

        let n = buckets.iter().map(Vec::len).max().unwrap_or(0);
        if n == 0 {
            return Ok(LayerSet::default());
        }
        for bucket in &mut buckets {
            bucket.resize_with(n, Vec::new);
        }

        // Layer lists per postfix position; children are taken when merged
        let mut slots: Vec<Option<Vec<Layer>>> = vec![None; self.tree.len()];
        for (position, token) in self.tree.tokens().iter().enumerate() {
            let merged = match *token {
                Token::Leaf { species } => std::mem::take(&mut buckets[species]),
                Token::Internal { .. } => {
                    let (left, right) = self.tree.children(position).unwrap_or_default();
                    let left = slots[left].take().unwrap_or_else(|| vec![Vec::new(); n]);
                    let right = slots[right].take().unwrap_or_else(|| vec![Vec::new(); n]);
                    self.merge_pair(left, right)?
                }
            };
            slots[position] = Some(merged);
        }

        let root = slots[self.tree.root()].take().unwrap_or_default();
        Ok(self.into_layer_set(root))
    }

    /// Append to each left layer the right layer the matching pairs it with
    fn merge_pair(
        &self,
        mut left: Vec<Layer>,
        mut right: Vec<Layer>,
    ) -> Result<Vec<Layer>, LayerError> {
        let n = left.len();
        let mut matrix = CostMatrix::zeros(n);
        for (j, left_layer) in left.iter().enumerate() {
            for (k, right_layer) in right.iter().enumerate() {
                for a in left_layer {
                    for b in right_layer {
                        if let Some(score) = self.graph.score(a, b) {
                            // Scores are truncated per pair before summing
                            #[allow(clippy::cast_possible_truncation)]
                            let weight = score.trunc() as i64;
                            matrix.add(j, k, weight)?;
                        }
                    }
                }
            }
        }

        let matching = max_weight_matching(&matrix);
        debug!(
            "Merged {n} layers with total similarity {}",
            matching.total_weight
        );

        for (j, &k) in matching.assignment.iter().enumerate() {
            let genes = std::mem::take(&mut right[k]);
            left[j].extend(genes);
        }
        Ok(left)
    }

    fn into_layer_set(&self, layers: Vec<Layer>) -> LayerSet {
        let species_count = self.tree.species_count();
        let mut trees = Vec::with_capacity(layers.len());
        let mut gene_names = Vec::with_capacity(layers.len());

        for layer in layers {
            let mut names: Vec<Option<String>> = vec![None; species_count];
            for gene in layer {
                if let Some(species) = self.graph.species_of(&gene) {
                    names[species] = Some(gene);
                }
            }
            let presence: Vec<bool> = names.iter().map(Option::is_some).collect();
            trees.push(ParallelTree::from_presence(self.tree, &presence));
            gene_names.push(names);
        }

        LayerSet { trees, gene_names }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genes(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_one_to_one_orthologs() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a", 0, "b", 1, 10.0);
        graph.add_pair("a", 0, "c", 2, 8.0);

        let set = LayerMerger::new(&tree, &graph)
            .merge(&genes(&["a", "b", "c"]))
            .unwrap();
        assert_eq!(set.layer_count(), 1);
        assert_eq!(set.trees[0].to_string(), "11N1N");
        assert_eq!(set.gene(0, 0), Some("a"));
        assert_eq!(set.gene(0, 1), Some("b"));
        assert_eq!(set.gene(0, 2), Some("c"));
    }

    #[test]
    fn test_paralogs_follow_best_scores() {
        // Species 0 has a duplicate pair; b2 is clearly closer to a2
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a1", 0, "b1", 1, 50.0);
        graph.add_pair("a2", 0, "b1", 1, 10.0);
        graph.add_pair("a2", 0, "b2", 1, 90.0);
        graph.add_pair("a1", 0, "b2", 1, 5.0);

        let set = LayerMerger::new(&tree, &graph)
            .merge(&genes(&["a1", "a2", "b1", "b2"]))
            .unwrap();
        assert_eq!(set.layer_count(), 2);
        assert_eq!(set.gene(0, 0), Some("a1"));
        assert_eq!(set.gene(0, 1), Some("b1"));
        assert_eq!(set.gene(1, 0), Some("a2"));
        assert_eq!(set.gene(1, 1), Some("b2"));
    }

    #[test]
    fn test_padding_for_missing_species() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a1", 0, "c1", 2, 30.0);
        graph.add_pair("a2", 0, "c1", 2, 20.0);

        let set = LayerMerger::new(&tree, &graph)
            .merge(&genes(&["a1", "a2", "c1"]))
            .unwrap();
        assert_eq!(set.layer_count(), 2);

        let mut placed: Vec<&str> = set
            .gene_names
            .iter()
            .flatten()
            .filter_map(Option::as_deref)
            .collect();
        placed.sort_unstable();
        assert_eq!(placed, vec!["a1", "a2", "c1"]);
        assert_eq!(set.gene(0, 2), Some("c1"));
        for tree_layer in &set.trees {
            assert!(tree_layer.fits(&tree));
        }
    }

    #[test]
    fn test_unknown_gene_is_skipped() {
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a", 0, "b", 1, 1.0);

        let set = LayerMerger::new(&tree, &graph)
            .merge(&genes(&["a", "ghost", "b"]))
            .unwrap();
        assert_eq!(set.layer_count(), 1);
        assert_eq!(set.trees[0].to_string(), "11N");
    }

    #[test]
    fn test_species_out_of_range() {
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a", 0, "z", 5, 1.0);

        let err = LayerMerger::new(&tree, &graph)
            .merge(&genes(&["a", "z"]))
            .unwrap_err();
        assert!(matches!(err, LayerError::SpeciesOutOfRange { species: 5, .. }));
    }

    #[test]
    fn test_oversized_scores_fail_the_component() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a", 0, "b", 1, 1e19);
        graph.add_pair("a", 0, "c", 2, 1e19);
        graph.add_pair("b", 1, "c", 2, 1e19);

        let err = LayerMerger::new(&tree, &graph)
            .merge(&genes(&["a", "b", "c"]))
            .unwrap_err();
        assert!(matches!(
            err,
            LayerError::Matching(MatchError::WeightOverflow { .. })
        ));
    }

    #[test]
    fn test_empty_component() {
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        let graph = OrthologyGraph::new();
        let set = LayerMerger::new(&tree, &graph).merge(&[]).unwrap();
        assert!(set.is_empty());
    }
}
