//! Joint labeling of all layers at once, node by node.
//!
//! Every species-tree node carries a map from [`StateKey`] (the state of all
//! layers at that node) to the cheapest way of producing it from the subtree
//! below. The union constraints are enforced locally on each parent/child
//! edge, so the map at the root already contains only valid labelings.
//!
//! To keep the merge of the two children linear in the number of states, each
//! child's transitions are split by parent kind before combining:
//!
//! - `present`: the parent has at least one present layer
//! - `empty`: the parent is absent in every layer and the child subtree is
//!   empty in every layer
//! - `nonempty`: the parent is absent in every layer, the child subtree is not
//!   empty
//!
//! A parent that is absent in every layer may pair `empty` with `empty` or
//! `nonempty`, never `nonempty` with `nonempty`. Transitions where a parent
//! with a present layer sits above an all-absent but nonempty child are
//! dropped.
//!
//! The number of states grows quickly with the layer count, so this strategy
//! is only selected for a handful of layers.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::layer::{LabeledTree, ParallelTree};
use crate::core::species_tree::SpeciesTree;
use crate::labeling::keys::{StateKey, ABSENT, EMPTY, PRESENT};
use crate::labeling::{check_layers, Labeler, Labeling, LabelingError};

#[derive(Debug, Clone)]
struct Choice {
    cost: usize,
    children: Option<(StateKey, StateKey)>,
}

/// Cheapest transition into a parent key, with the child key that achieved it
type Bucket = BTreeMap<StateKey, (usize, StateKey)>;

#[derive(Default)]
struct SideBuckets {
    present: Bucket,
    empty: Bucket,
    nonempty: Bucket,
}

fn keep_min(bucket: &mut Bucket, parent: StateKey, cost: usize, child: &StateKey) {
    match bucket.get(&parent) {
        Some((existing, _)) if *existing <= cost => {}
        _ => {
            bucket.insert(parent, (cost, child.clone()));
        }
    }
}

/// Node-centric labeler
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeCentricSolver;

impl NodeCentricSolver {
    /// Enumerate the parent keys reachable from one child state and bucket them.
    fn expand_child(
        occupied: &[bool],
        child: &StateKey,
        child_cost: usize,
        buckets: &mut SideBuckets,
    ) {
        let options: Vec<&'static [u8]> = child
            .slots()
            .iter()
            .zip(occupied)
            .map(|(&slot, &occupied)| parent_options(slot, occupied))
            .collect();

        let child_has_present = child.has_present();
        let child_all_empty = child.is_all_empty();
        let mut parent = vec![EMPTY; child.len()];

        for_each_choice(&options, 0, &mut parent, &mut |slots| {
            let flips = slots
                .iter()
                .zip(child.slots())
                .filter(|(p, c)| (*p & 1) != (*c & 1))
                .count();
            let cost = child_cost + flips;
            let parent = StateKey::new(slots.to_vec());

            if parent.has_present() {
                if !child_has_present && !child_all_empty {
                    return;
                }
                keep_min(&mut buckets.present, parent, cost, child);
            } else if child_all_empty {
                keep_min(&mut buckets.empty, parent, cost, child);
            } else {
                keep_min(&mut buckets.nonempty, parent, cost, child);
            }
        });
    }

    fn combine(left: &SideBuckets, right: &SideBuckets) -> BTreeMap<StateKey, Choice> {
        let mut states: BTreeMap<StateKey, Choice> = BTreeMap::new();
        let mut offer = |parent: &StateKey, l: &(usize, StateKey), r: &(usize, StateKey)| {
            let cost = l.0 + r.0;
            match states.get(parent) {
                Some(existing) if existing.cost <= cost => {}
                _ => {
                    states.insert(
                        parent.clone(),
                        Choice {
                            cost,
                            children: Some((l.1.clone(), r.1.clone())),
                        },
                    );
                }
            }
        };

        for (parent, l) in &left.present {
            if let Some(r) = right.present.get(parent) {
                offer(parent, l, r);
            }
        }
        for (parent, l) in &left.empty {
            if let Some(r) = right.empty.get(parent) {
                offer(parent, l, r);
            }
            if let Some(r) = right.nonempty.get(parent) {
                offer(parent, l, r);
            }
        }
        for (parent, r) in &right.empty {
            if let Some(l) = left.nonempty.get(parent) {
                offer(parent, l, r);
            }
        }
        states
    }
}

/// Parent slot values allowed above one child slot
fn parent_options(child_slot: u8, occupied: bool) -> &'static [u8] {
    if !occupied {
        &[EMPTY]
    } else if child_slot == ABSENT {
        &[ABSENT]
    } else {
        &[PRESENT, ABSENT]
    }
}

/// Visit every combination picking one value per slot from `options`
fn for_each_choice<F>(options: &[&[u8]], index: usize, current: &mut [u8], visit: &mut F)
where
    F: FnMut(&[u8]),
{
    if index == options.len() {
        visit(current);
        return;
    }
    for &value in options[index] {
        current[index] = value;
        for_each_choice(options, index + 1, current, visit);
    }
}

impl Labeler for NodeCentricSolver {
    fn name(&self) -> &'static str {
        "node-centric"
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

        // occupied[pos][layer]: the layer has a gene somewhere under pos
        let mut occupied: Vec<Vec<bool>> = Vec::with_capacity(tree.len());
        let mut nodes: Vec<BTreeMap<StateKey, Choice>> = Vec::with_capacity(tree.len());

        for pos in 0..tree.len() {
            match tree.children(pos) {
                None => {
                    let slots: Vec<u8> = layers
                        .iter()
                        .map(|layer| if layer.is_present(pos) { PRESENT } else { EMPTY })
                        .collect();
                    occupied.push(slots.iter().map(|&s| s == PRESENT).collect());
                    let mut states = BTreeMap::new();
                    states.insert(
                        StateKey::new(slots),
                        Choice {
                            cost: 0,
                            children: None,
                        },
                    );
                    nodes.push(states);
                }
                Some((l, r)) => {
                    let occ: Vec<bool> = occupied[l]
                        .iter()
                        .zip(&occupied[r])
                        .map(|(a, b)| *a || *b)
                        .collect();

                    let mut left = SideBuckets::default();
                    for (key, choice) in &nodes[l] {
                        Self::expand_child(&occ, key, choice.cost, &mut left);
                    }
                    let mut right = SideBuckets::default();
                    for (key, choice) in &nodes[r] {
                        Self::expand_child(&occ, key, choice.cost, &mut right);
                    }

                    let states = Self::combine(&left, &right);
                    debug!("Node {pos}: {} states", states.len());
                    occupied.push(occ);
                    nodes.push(states);
                }
            }
        }

        let root = tree.root();
        let mut best: Option<(&StateKey, usize)> = None;
        for (key, choice) in &nodes[root] {
            if best.map_or(true, |(_, cost)| choice.cost < cost) {
                best = Some((key, choice.cost));
            }
        }
        let Some((root_key, total)) = best else {
            return Err(LabelingError::Infeasible { layers: n });
        };

        // Walk back down, assigning each node the state its parent chose
        let mut assigned: Vec<Option<StateKey>> = vec![None; tree.len()];
        let mut stack = vec![(root, root_key.clone())];
        while let Some((pos, key)) = stack.pop() {
            if key.len() != n {
                return Err(LabelingError::KeySizeMismatch {
                    expected: n,
                    found: key.len(),
                    layers: n,
                });
            }
            if let (Some((l, r)), Some(choice)) = (tree.children(pos), nodes[pos].get(&key)) {
                if let Some((left_key, right_key)) = &choice.children {
                    stack.push((l, left_key.clone()));
                    stack.push((r, right_key.clone()));
                }
            }
            assigned[pos] = Some(key);
        }

        let mut labeled = Vec::with_capacity(n);
        for layer in 0..n {
            let labels = assigned
                .iter()
                .map(|key| key.as_ref().is_some_and(|key| key.label(layer)))
                .collect();
            labeled.push(LabeledTree::new(labels));
        }

        Ok(Labeling {
            total_substitutions: total,
            layers: labeled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(patterns: &[&str]) -> Vec<ParallelTree> {
        patterns.iter().map(|p| p.parse().unwrap()).collect()
    }

    fn run(tree: &str, patterns: &[&str]) -> Labeling {
        let tree = SpeciesTree::from_postfix(tree).unwrap();
        NodeCentricSolver.label(&tree, &layers(patterns)).unwrap()
    }

    #[test]
    fn test_all_present_needs_no_changes() {
        let labeling = run("11N1N", &["11N1N"]);
        assert_eq!(labeling.total_substitutions, 0);
        assert_eq!(labeling.layers[0].to_string(), "11111");
    }

    #[test]
    fn test_single_gene_is_born_at_its_leaf() {
        let labeling = run("11N1N", &["10N0N"]);
        assert_eq!(labeling.total_substitutions, 1);
        assert_eq!(labeling.layers[0].to_string(), "10000");
    }

    #[test]
    fn test_two_species_one_missing() {
        let labeling = run("11N", &["10N"]);
        assert_eq!(labeling.total_substitutions, 1);
        // Either a loss below a present root or a birth below an absent root
        let label = labeling.layers[0].to_string();
        assert!(label == "101" || label == "100", "{label}");
    }

    #[test]
    fn test_leaf_labels_are_reproduced() {
        let labeling = run("11N11NN", &["10N01NN", "01N11NN"]);
        let tree = SpeciesTree::from_postfix("11N11NN").unwrap();
        for (labeled, pattern) in labeling.layers.iter().zip(["10N01NN", "01N11NN"]) {
            let pattern: ParallelTree = pattern.parse().unwrap();
            for &pos in &[0, 1, 3, 4] {
                assert_eq!(labeled.is_present(pos), pattern.is_present(pos));
            }
        }
        let recount: usize = labeling
            .layers
            .iter()
            .map(|layer| layer.substitutions(&tree))
            .sum();
        assert_eq!(recount, labeling.total_substitutions);
    }

    #[test]
    fn test_single_leaf_tree() {
        let labeling = run("1", &["1", "0"]);
        assert_eq!(labeling.total_substitutions, 0);
        assert_eq!(labeling.layers[0].to_string(), "1");
        assert_eq!(labeling.layers[1].to_string(), "0");
    }

    #[test]
    fn test_no_layers() {
        let labeling = run("11N", &[]);
        assert_eq!(labeling.total_substitutions, 0);
        assert!(labeling.layers.is_empty());
    }

    #[test]
    fn test_shape_mismatch() {
        let tree = SpeciesTree::from_postfix("11N").unwrap();
        let err = NodeCentricSolver
            .label(&tree, &layers(&["11N", "1N1"]))
            .unwrap_err();
        assert_eq!(err, LabelingError::ShapeMismatch { layer: 1 });
    }
}
