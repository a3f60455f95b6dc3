//! Orchestration of a full run over gene families.
//!
//! - [`components`]: connected components of a family in the orthology graph
//! - [`engine`]: per-component processing and the parallel fan-out
//! - [`results`]: per-component outcomes and the merged run totals

pub mod components;
pub mod engine;
pub mod results;

pub use engine::{ComponentError, ReconcileConfig, ReconciliationEngine};
pub use results::{ComponentResult, RunResults, RunSummary};
