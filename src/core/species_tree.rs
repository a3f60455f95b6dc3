use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeciesTreeError {
    #[error("Species tree is empty")]
    Empty,

    #[error("Invalid species tree token '{token}' at position {position}")]
    InvalidToken { token: char, position: usize },

    #[error("Malformed species tree at position {position}: {reason}")]
    Malformed { position: usize, reason: String },

    #[error("Species tree has {found} leaves but {expected} species were declared")]
    SpeciesCountMismatch { expected: usize, found: usize },
}

/// Kind of a postfix token before numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Internal,
}

/// A numbered postfix token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// The k-th leaf in postfix order is species k
    Leaf { species: usize },
    /// The k-th internal node in postfix order
    Internal { ordinal: usize },
}

impl Token {
    #[must_use]
    pub fn is_leaf(self) -> bool {
        matches!(self, Token::Leaf { .. })
    }
}

/// A rooted binary species tree stored in postfix order.
///
/// Every node is addressed by its position in the postfix sequence, so the
/// root is always the last position and children always precede parents.
/// Child positions are resolved once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesTree {
    tokens: Vec<Token>,
    children: Vec<Option<(usize, usize)>>,
    leaf_positions: Vec<usize>,
    internal_positions: Vec<usize>,
}

impl SpeciesTree {
    /// Build a tree from postfix node kinds, validating the stack discipline.
    ///
    /// # Errors
    ///
    /// Returns `SpeciesTreeError::Empty` for an empty sequence and
    /// `SpeciesTreeError::Malformed` if an internal token finds fewer than two
    /// subtrees or the reduction does not end with exactly one tree.
    pub fn from_kinds<I>(kinds: I) -> Result<Self, SpeciesTreeError>
    where
        I: IntoIterator<Item = NodeKind>,
    {
        let mut tokens = Vec::new();
        let mut children = Vec::new();
        let mut leaf_positions = Vec::new();
        let mut internal_positions = Vec::new();
        let mut stack: Vec<usize> = Vec::new();

        for (position, kind) in kinds.into_iter().enumerate() {
            match kind {
                NodeKind::Leaf => {
                    tokens.push(Token::Leaf {
                        species: leaf_positions.len(),
                    });
                    children.push(None);
                    leaf_positions.push(position);
                }
                NodeKind::Internal => {
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return Err(SpeciesTreeError::Malformed {
                            position,
                            reason: "internal node needs two subtrees".to_string(),
                        });
                    };
                    tokens.push(Token::Internal {
                        ordinal: internal_positions.len(),
                    });
                    children.push(Some((left, right)));
                    internal_positions.push(position);
                }
            }
            stack.push(position);
        }

        match stack.len() {
            0 => Err(SpeciesTreeError::Empty),
            1 => Ok(Self {
                tokens,
                children,
                leaf_positions,
                internal_positions,
            }),
            n => Err(SpeciesTreeError::Malformed {
                position: tokens.len(),
                reason: format!("{n} subtrees left after reduction"),
            }),
        }
    }

    /// Parse a postfix string over `{0, 1, N}`.
    ///
    /// `0` and `1` are leaf placeholders, `N` merges the two most recent
    /// subtrees. Whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `SpeciesTreeError::InvalidToken` for any other character, or the
    /// errors of [`SpeciesTree::from_kinds`].
    pub fn from_postfix(text: &str) -> Result<Self, SpeciesTreeError> {
        let mut kinds = Vec::with_capacity(text.len());
        for (position, c) in text.chars().filter(|c| !c.is_whitespace()).enumerate() {
            match c {
                '0' | '1' => kinds.push(NodeKind::Leaf),
                'N' => kinds.push(NodeKind::Internal),
                token => return Err(SpeciesTreeError::InvalidToken { token, position }),
            }
        }
        Self::from_kinds(kinds)
    }

    /// Check the leaf count against a declared species count.
    ///
    /// # Errors
    ///
    /// Returns `SpeciesTreeError::SpeciesCountMismatch` when they differ.
    pub fn with_species_count(self, expected: usize) -> Result<Self, SpeciesTreeError> {
        if self.species_count() == expected {
            Ok(self)
        } else {
            Err(SpeciesTreeError::SpeciesCountMismatch {
                expected,
                found: self.species_count(),
            })
        }
    }

    /// Number of postfix positions (leaves plus internal nodes)
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false for a constructed tree
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn species_count(&self) -> usize {
        self.leaf_positions.len()
    }

    #[must_use]
    pub fn internal_count(&self) -> usize {
        self.internal_positions.len()
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn token(&self, position: usize) -> Token {
        self.tokens[position]
    }

    #[must_use]
    pub fn is_leaf(&self, position: usize) -> bool {
        self.tokens[position].is_leaf()
    }

    /// Left and right child positions of an internal node; `None` for leaves
    #[must_use]
    pub fn children(&self, position: usize) -> Option<(usize, usize)> {
        self.children[position]
    }

    #[must_use]
    pub fn root(&self) -> usize {
        self.tokens.len() - 1
    }

    /// Postfix position of the leaf for `species`
    #[must_use]
    pub fn leaf_position(&self, species: usize) -> usize {
        self.leaf_positions[species]
    }

    /// Postfix positions of internal nodes, in postfix order
    #[must_use]
    pub fn internal_positions(&self) -> &[usize] {
        &self.internal_positions
    }

    /// Species indices of all leaves below (or at) `position`, left to right
    #[must_use]
    pub fn leaves_under(&self, position: usize) -> Vec<usize> {
        let mut species = Vec::new();
        let mut stack = vec![position];
        while let Some(pos) = stack.pop() {
            match (self.tokens[pos], self.children[pos]) {
                (Token::Leaf { species: s }, _) => species.push(s),
                (Token::Internal { .. }, Some((left, right))) => {
                    stack.push(right);
                    stack.push(left);
                }
                (Token::Internal { .. }, None) => {}
            }
        }
        species
    }
}

impl fmt::Display for SpeciesTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            let c = if token.is_leaf() { '1' } else { 'N' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
