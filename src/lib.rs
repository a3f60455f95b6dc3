//! # ortho-solver
//!
//! A library for assigning ortholog groups across many species by
//! reconciling gene families with a species tree.
//!
//! Pairwise ortholog scores tell us which genes of two species correspond,
//! but not how a whole family evolved. `ortho-solver` merges each family into
//! parallel layers (one gene per species per layer), infers where each layer
//! was present in the ancestors with the fewest presence/absence changes, and
//! reads gene births, duplications, losses and ortholog groups off the result.
//!
//! ## Features
//!
//! - **Layer merging**: Kuhn–Munkres maximum-weight matching of ortholog scores
//! - **Two exact labelers**: node-centric for few layers, tree-centric for many
//! - **Event calling**: births, duplications and per-clade loss counts
//! - **Parallel runs**: gene families processed on a rayon pool
//!
//! ## Example
//!
//! ```rust
//! use ortho_solver::{label_layers, LabelingStrategy, ParallelTree, SpeciesTree};
//!
//! let tree = SpeciesTree::from_postfix("11N1N").unwrap();
//! let layers: Vec<ParallelTree> = vec!["10N1N".parse().unwrap()];
//!
//! let labeling = label_layers(&tree, &layers, LabelingStrategy::Auto, 5).unwrap();
//! assert_eq!(labeling.total_substitutions, 1);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Species trees, layers and the orthology graph
//! - [`matching`]: Hungarian matching and layer merging
//! - [`labeling`]: Minimum-substitution labeling of internal nodes
//! - [`reconcile`]: Events and ortholog groups from a labeling
//! - [`pipeline`]: Family components and the parallel run
//! - [`parsing`]: Species tree, pair file and family file loaders
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod labeling;
pub mod matching;
pub mod parsing;
pub mod pipeline;
pub mod reconcile;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::layer::{LabeledTree, ParallelTree};
pub use core::orthology::OrthologyGraph;
pub use core::species_tree::SpeciesTree;
pub use labeling::{label_layers, Labeling, LabelingStrategy};
pub use matching::layers::{LayerMerger, LayerSet};
pub use pipeline::{ReconcileConfig, ReconciliationEngine, RunResults};
pub use reconcile::{reconcile, OrthoGroup, Reconciliation, ReconciliationEvent};
