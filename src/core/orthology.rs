use std::collections::HashMap;

/// Pairwise orthology evidence loaded before any family is processed.
///
/// Holds the gene → species map, the symmetric adjacency lists and the
/// symmetric similarity scores. Read-only once loading finishes.
#[derive(Debug, Clone, Default)]
pub struct OrthologyGraph {
    species: HashMap<String, usize>,
    neighbors: HashMap<String, Vec<String>>,
    scores: HashMap<String, HashMap<String, f64>>,
}

impl OrthologyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an orthologous pair.
    ///
    /// Both genes are assigned their species, linked in both directions and
    /// scored symmetrically. A repeated pair overwrites the score without
    /// duplicating the adjacency edge.
    pub fn add_pair(
        &mut self,
        gene_a: &str,
        species_a: usize,
        gene_b: &str,
        species_b: usize,
        score: f64,
    ) {
        self.species.insert(gene_a.to_string(), species_a);
        self.species.insert(gene_b.to_string(), species_b);

        let existed = self
            .scores
            .entry(gene_a.to_string())
            .or_default()
            .insert(gene_b.to_string(), score)
            .is_some();
        self.scores
            .entry(gene_b.to_string())
            .or_default()
            .insert(gene_a.to_string(), score);

        if !existed {
            self.neighbors
                .entry(gene_a.to_string())
                .or_default()
                .push(gene_b.to_string());
            self.neighbors
                .entry(gene_b.to_string())
                .or_default()
                .push(gene_a.to_string());
        }
    }

    /// Register a gene's species without any orthology edge
    pub fn add_gene(&mut self, gene: &str, species: usize) {
        self.species.insert(gene.to_string(), species);
    }

    #[must_use]
    pub fn species_of(&self, gene: &str) -> Option<usize> {
        self.species.get(gene).copied()
    }

    /// Orthologs of `gene` in insertion order
    #[must_use]
    pub fn neighbors(&self, gene: &str) -> &[String] {
        self.neighbors.get(gene).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn score(&self, gene_a: &str, gene_b: &str) -> Option<f64> {
        self.scores.get(gene_a)?.get(gene_b).copied()
    }

    #[must_use]
    pub fn gene_count(&self) -> usize {
        self.species.len()
    }

    /// Number of distinct unordered pairs
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.neighbors.values().map(Vec::len).sum::<usize>() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_pair_is_symmetric() {
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a0", 0, "b0", 1, 42.5);

        assert_eq!(graph.species_of("a0"), Some(0));
        assert_eq!(graph.species_of("b0"), Some(1));
        assert_eq!(graph.score("a0", "b0"), Some(42.5));
        assert_eq!(graph.score("b0", "a0"), Some(42.5));
        assert_eq!(graph.neighbors("a0"), &["b0".to_string()]);
        assert_eq!(graph.neighbors("b0"), &["a0".to_string()]);
        assert_eq!(graph.pair_count(), 1);
    }

    #[test]
    fn test_repeated_pair_overwrites_score() {
        let mut graph = OrthologyGraph::new();
        graph.add_pair("a0", 0, "b0", 1, 1.0);
        graph.add_pair("b0", 1, "a0", 0, 7.0);

        assert_eq!(graph.score("a0", "b0"), Some(7.0));
        assert_eq!(graph.neighbors("a0").len(), 1);
        assert_eq!(graph.pair_count(), 1);
    }

    #[test]
    fn test_unknown_gene() {
        let graph = OrthologyGraph::new();
        assert_eq!(graph.species_of("missing"), None);
        assert!(graph.neighbors("missing").is_empty());
        assert_eq!(graph.score("missing", "other"), None);
    }
}
