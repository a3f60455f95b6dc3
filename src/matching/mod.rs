//! Assigning the genes of a component to parallel layers.
//!
//! - [`hungarian`]: maximum-weight perfect matching on a square score matrix
//! - [`layers`]: [`LayerMerger`], which walks the species tree bottom-up and,
//!   at each internal node, pairs the layers of its two child subtrees by
//!   maximum-weight matching of their summed ortholog scores
//!
//! ## Example
//!
//! ```rust
//! use ortho_solver::matching::hungarian::{max_weight_matching, CostMatrix};
//!
//! let matrix = CostMatrix::from_rows(&[vec![10, 5, 2], vec![7, 8, 3], vec![6, 0, 9]]).unwrap();
//! let matching = max_weight_matching(&matrix);
//! assert_eq!(matching.total_weight, 27);
//! ```

pub mod hungarian;
pub mod layers;

pub use hungarian::{max_weight_matching, CostMatrix, MatchError, Matching};
pub use layers::{LayerError, LayerMerger, LayerSet};
