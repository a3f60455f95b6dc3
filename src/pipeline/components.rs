use std::collections::{BTreeSet, HashSet};

use tracing::warn;

use crate::core::orthology::OrthologyGraph;

/// Split a family into connected components of the orthology graph.
///
/// Traversal only follows edges between members of the family. Members
/// missing from the species map are skipped with a warning. Components are
/// returned in order of their smallest gene; genes within a component are in
/// depth-first discovery order.
#[must_use]
pub fn family_components(graph: &OrthologyGraph, family: &BTreeSet<String>) -> Vec<Vec<String>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();

    for start in family {
        if visited.contains(start.as_str()) {
            continue;
        }
        if graph.species_of(start).is_none() {
            warn!("Skipping gene '{start}': not present in the species map");
            visited.insert(start.as_str());
            continue;
        }

        let mut component = Vec::new();
        let mut stack: Vec<&str> = vec![start.as_str()];
        while let Some(gene) = stack.pop() {
            if !visited.insert(gene) {
                continue;
            }
            component.push(gene.to_string());
            // Reversed so the first neighbor is explored first
            for next in graph.neighbors(gene).iter().rev() {
                if family.contains(next) && !visited.contains(next.as_str()) {
                    stack.push(next.as_str());
                }
            }
        }
        components.push(component);
    }

    components
}
