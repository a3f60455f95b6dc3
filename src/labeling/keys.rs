//! Map keys used by the two labeling strategies.
//!
//! Both compare and hash structurally, so equal labelings always collide
//! regardless of how they were produced.

/// Slot value: the layer has nothing anywhere below this node
pub const EMPTY: u8 = 0;
/// Slot value: the layer is present at this node
pub const PRESENT: u8 = 1;
/// Slot value: the layer is absent here but present somewhere below
pub const ABSENT: u8 = 2;

/// Joint state of every layer at one species-tree node.
///
/// One slot per layer. The low bit of a slot is that layer's presence label;
/// see [`EMPTY`], [`PRESENT`] and [`ABSENT`]. Ordered lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Vec<u8>);

impl StateKey {
    #[must_use]
    pub fn new(slots: Vec<u8>) -> Self {
        Self(slots)
    }

    #[must_use]
    pub fn empty(layers: usize) -> Self {
        Self(vec![EMPTY; layers])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[u8] {
        &self.0
    }

    /// Presence label of one layer
    #[must_use]
    pub fn label(&self, layer: usize) -> bool {
        self.0[layer] & 1 == 1
    }

    /// True if any layer is present at this node
    #[must_use]
    pub fn has_present(&self) -> bool {
        self.0.iter().any(|slot| slot & 1 == 1)
    }

    /// True if every layer's subtree is empty
    #[must_use]
    pub fn is_all_empty(&self) -> bool {
        self.0.iter().all(|&slot| slot == EMPTY)
    }
}

/// Internal-node labeling of a single layer, one bit per internal node in
/// postfix order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelKey {
    len: usize,
    words: Vec<u64>,
}

impl LabelKey {
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(64)],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        let mask = 1u64 << (index % 64);
        if value {
            self.words[index / 64] |= mask;
        } else {
            self.words[index / 64] &= !mask;
        }
    }

    /// Bitwise OR of two keys; `None` if their lengths differ
    #[must_use]
    pub fn union(&self, other: &Self) -> Option<Self> {
        if self.len != other.len {
            return None;
        }
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a | b)
            .collect();
        Some(Self {
            len: self.len,
            words,
        })
    }

    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
