//! Core data types for gene-family reconciliation.
//!
//! - [`SpeciesTree`]: a rooted binary species tree in postfix form
//! - [`ParallelTree`]: one layer of a component, presence at every leaf
//! - [`LabeledTree`]: a layer with presence inferred at every internal node
//! - [`OrthologyGraph`]: species map, ortholog adjacency and pair scores
//!
//! ## Postfix encoding
//!
//! Trees are written children first, one symbol per node:
//!
//! | Symbol | Meaning                       |
//! |--------|-------------------------------|
//! | `1`    | leaf, gene present            |
//! | `0`    | leaf, gene absent             |
//! | `N`    | internal node, not yet labeled |
//!
//! `((A,B),C)` is `11N1N`. Leaves are numbered left to right; the k-th leaf
//! symbol is species k.

pub mod layer;
pub mod orthology;
pub mod species_tree;

pub use layer::{LabeledTree, ParallelTree};
pub use orthology::OrthologyGraph;
pub use species_tree::{SpeciesTree, SpeciesTreeError};
