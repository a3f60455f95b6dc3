use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::orthology::OrthologyGraph;
use crate::core::species_tree::SpeciesTree;
use crate::labeling::{label_layers, LabelingError, LabelingStrategy};
use crate::matching::layers::{LayerError, LayerMerger};
use crate::parsing::families::GeneFamily;
use crate::pipeline::components::family_components;
use crate::pipeline::results::{ComponentResult, RunResults};
use crate::reconcile::reconcile;

/// A component that could not be reconciled. Only that component is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("Family {family}, component of {genes} genes: {source}")]
    Layers {
        family: usize,
        genes: usize,
        source: LayerError,
    },

    #[error("Family {family}, component of {genes} genes in {layers} layers: {source}")]
    Labeling {
        family: usize,
        genes: usize,
        layers: usize,
        source: LabelingError,
    },
}

/// Configuration for a reconciliation run
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Labeling strategy
    pub strategy: LabelingStrategy,

    /// `Auto` uses the node-centric solver below this many layers
    pub node_centric_max_layers: usize,

    /// Worker threads; `None` uses all available cores
    pub num_threads: Option<usize>,

    /// Smallest ortholog group reported
    pub min_group_size: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            strategy: LabelingStrategy::Auto,
            node_centric_max_layers: 5,
            num_threads: None,
            min_group_size: 2,
        }
    }
}

/// Runs layer merging, labeling and reconciliation over gene families
pub struct ReconciliationEngine<'a> {
    tree: &'a SpeciesTree,
    graph: &'a OrthologyGraph,
    config: ReconcileConfig,
}

impl<'a> ReconciliationEngine<'a> {
    #[must_use]
    pub fn new(tree: &'a SpeciesTree, graph: &'a OrthologyGraph, config: ReconcileConfig) -> Self {
        Self {
            tree,
            graph,
            config,
        }
    }

    /// Reconcile one connected component.
    ///
    /// # Errors
    ///
    /// Returns `ComponentError` if the layers cannot be built or labeled.
    pub fn process_component(
        &self,
        family: usize,
        genes: &[String],
    ) -> Result<ComponentResult, ComponentError> {
        let layers = LayerMerger::new(self.tree, self.graph)
            .merge(genes)
            .map_err(|source| ComponentError::Layers {
                family,
                genes: genes.len(),
                source,
            })?;

        let strategy = self
            .config
            .strategy
            .resolve(layers.layer_count(), self.config.node_centric_max_layers);
        let labeling = label_layers(
            self.tree,
            &layers.trees,
            strategy,
            self.config.node_centric_max_layers,
        )
        .map_err(|source| ComponentError::Labeling {
            family,
            genes: genes.len(),
            layers: layers.layer_count(),
            source,
        })?;

        let reconciliation = reconcile(self.tree, &labeling, &layers, self.config.min_group_size);
        debug!(
            "Family {family}: {} genes, {} layers, {} substitutions",
            genes.len(),
            layers.layer_count(),
            labeling.total_substitutions
        );

        Ok(ComponentResult {
            family,
            genes: genes.len(),
            layers: layers.layer_count(),
            strategy,
            total_substitutions: labeling.total_substitutions,
            reconciliation,
        })
    }

    /// Reconcile every component of a family into a family-local result.
    ///
    /// Failed components are logged and counted; the rest still contribute.
    #[must_use]
    pub fn process_family(&self, family: &GeneFamily) -> RunResults {
        let mut results = RunResults {
            families: 1,
            ..RunResults::default()
        };

        for component in family_components(self.graph, &family.genes) {
            match self.process_component(family.id, &component) {
                Ok(result) => results.absorb(result),
                Err(e) => {
                    warn!("Skipping component: {e}");
                    results.record_failure();
                }
            }
        }
        results
    }

    /// Process all families on a dedicated rayon pool.
    ///
    /// Each family is computed locally and merged into the shared results
    /// under one lock, once per family.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread pool cannot be built.
    pub fn run(&self, families: &[GeneFamily]) -> Result<RunResults, rayon::ThreadPoolBuildError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(num_threads) = self.config.num_threads {
            builder = builder.num_threads(num_threads);
        }
        let pool = builder.build()?;
        info!(
            "Processing {} gene families on {} threads",
            families.len(),
            pool.current_num_threads()
        );

        let sink = Mutex::new(RunResults::default());
        pool.install(|| {
            families.par_iter().for_each(|family| {
                let local = self.process_family(family);
                sink.lock().unwrap_or_else(PoisonError::into_inner).merge(local);
            });
        });

        Ok(sink.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}
