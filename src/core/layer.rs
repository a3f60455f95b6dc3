use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::core::species_tree::{SpeciesTree, Token};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid symbol '{symbol}' at position {position}")]
pub struct SymbolError {
    pub symbol: char,
    pub position: usize,
}

/// One position of a parallel tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `0`: no gene of this layer in the species
    Absent,
    /// `1`: the layer has a gene in the species
    Present,
    /// `N`: internal node, label not yet assigned
    Unlabeled,
}

impl Symbol {
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Symbol::Absent => '0',
            Symbol::Present => '1',
            Symbol::Unlabeled => 'N',
        }
    }
}

/// Presence/absence pattern of one layer laid over the species tree.
///
/// Leaf positions hold `0`/`1`, internal positions hold `N`. All parallel
/// trees of a component share the species tree's length and `N` positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParallelTree {
    symbols: Vec<Symbol>,
}

impl ParallelTree {
    /// Build a parallel tree from per-species presence flags
    #[must_use]
    pub fn from_presence(tree: &SpeciesTree, presence: &[bool]) -> Self {
        let symbols = tree
            .tokens()
            .iter()
            .map(|token| match *token {
                Token::Leaf { species } if presence.get(species).copied().unwrap_or(false) => {
                    Symbol::Present
                }
                Token::Leaf { .. } => Symbol::Absent,
                Token::Internal { .. } => Symbol::Unlabeled,
            })
            .collect();
        Self { symbols }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    #[must_use]
    pub fn is_present(&self, position: usize) -> bool {
        self.symbols[position] == Symbol::Present
    }

    /// True if the symbols line up with the tree's leaf and internal positions
    #[must_use]
    pub fn fits(&self, tree: &SpeciesTree) -> bool {
        self.symbols.len() == tree.len()
            && self
                .symbols
                .iter()
                .zip(tree.tokens())
                .all(|(symbol, token)| token.is_leaf() == (*symbol != Symbol::Unlabeled))
    }
}

impl fmt::Display for ParallelTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for ParallelTree {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols = s
            .trim()
            .chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(Symbol::Absent),
                '1' => Ok(Symbol::Present),
                'N' => Ok(Symbol::Unlabeled),
                symbol => Err(SymbolError { symbol, position }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { symbols })
    }
}

/// A fully labeled layer: presence at every species-tree position.
///
/// Leaf labels reproduce the layer's observed presence; internal labels are
/// the inferred ancestral presence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabeledTree {
    labels: Vec<bool>,
}

impl LabeledTree {
    #[must_use]
    pub fn new(labels: Vec<bool>) -> Self {
        Self { labels }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn is_present(&self, position: usize) -> bool {
        self.labels[position]
    }

    #[must_use]
    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    /// Number of parent/child edges whose labels differ
    #[must_use]
    pub fn substitutions(&self, tree: &SpeciesTree) -> usize {
        tree.internal_positions()
            .iter()
            .filter_map(|&pos| tree.children(pos).map(|children| (pos, children)))
            .map(|(pos, (left, right))| {
                usize::from(self.labels[pos] != self.labels[left])
                    + usize::from(self.labels[pos] != self.labels[right])
            })
            .sum()
    }
}

impl fmt::Display for LabeledTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &label in &self.labels {
            write!(f, "{}", if label { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl FromStr for LabeledTree {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let labels = s
            .trim()
            .chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                symbol => Err(SymbolError { symbol, position }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { labels })
    }
}

impl Serialize for LabeledTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_presence() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let layer = ParallelTree::from_presence(&tree, &[true, false, true]);
        assert_eq!(layer.to_string(), "10N1N");
        assert!(layer.fits(&tree));
        assert!(layer.is_present(0));
        assert!(!layer.is_present(1));
    }

    #[test]
    fn test_parse_and_fit() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let good: ParallelTree = "01N1N".parse().unwrap();
        assert!(good.fits(&tree));

        let shifted: ParallelTree = "0N11N".parse().unwrap();
        assert!(!shifted.fits(&tree));

        let short: ParallelTree = "01N".parse().unwrap();
        assert!(!short.fits(&tree));

        let err = "01X".parse::<ParallelTree>().unwrap_err();
        assert_eq!(err.symbol, 'X');
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_labeled_substitutions() {
        let tree = SpeciesTree::from_postfix("11N1N").unwrap();
        let labeled: LabeledTree = "10000".parse().unwrap();
        assert_eq!(labeled.substitutions(&tree), 1);

        let labeled: LabeledTree = "11111".parse().unwrap();
        assert_eq!(labeled.substitutions(&tree), 0);
        assert_eq!(labeled.to_string(), "11111");
    }
}
