use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::labeling::LabelingStrategy;
use crate::reconcile::{LossSite, OrthoGroup, Reconciliation, ReconciliationEvent};

/// Outcome of one successfully processed component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentResult {
    pub family: usize,
    pub genes: usize,
    pub layers: usize,
    pub strategy: LabelingStrategy,
    pub total_substitutions: usize,
    pub reconciliation: Reconciliation,
}

/// Results accumulated over components and families.
///
/// Births and duplications are sets of gene names, losses are counted per
/// site. Merging is commutative, so the order in which families finish does
/// not change the content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResults {
    pub births: BTreeSet<String>,
    pub duplications: BTreeSet<String>,
    pub losses: BTreeMap<LossSite, usize>,
    pub groups: BTreeSet<OrthoGroup>,
    pub families: usize,
    pub components_succeeded: usize,
    pub components_failed: usize,
    pub total_substitutions: usize,
}

impl RunResults {
    /// Fold one component into the totals
    pub fn absorb(&mut self, component: ComponentResult) {
        self.components_succeeded += 1;
        self.total_substitutions += component.total_substitutions;
        for event in component.reconciliation.events {
            match event {
                ReconciliationEvent::Birth(gene) => {
                    self.births.insert(gene);
                }
                ReconciliationEvent::Duplication(gene) => {
                    self.duplications.insert(gene);
                }
                ReconciliationEvent::Loss(site) => {
                    *self.losses.entry(site).or_insert(0) += 1;
                }
            }
        }
        self.groups.extend(component.reconciliation.groups);
    }

    pub fn record_failure(&mut self) {
        self.components_failed += 1;
    }

    /// Merge another partial result into this one
    pub fn merge(&mut self, other: RunResults) {
        self.births.extend(other.births);
        self.duplications.extend(other.duplications);
        for (site, count) in other.losses {
            *self.losses.entry(site).or_insert(0) += count;
        }
        self.groups.extend(other.groups);
        self.families += other.families;
        self.components_succeeded += other.components_succeeded;
        self.components_failed += other.components_failed;
        self.total_substitutions += other.total_substitutions;
    }

    #[must_use]
    pub fn loss_events(&self) -> usize {
        self.losses.values().sum()
    }

    #[must_use]
    pub fn summary(&self, elapsed_ms: u128) -> RunSummary {
        RunSummary {
            families: self.families,
            components_succeeded: self.components_succeeded,
            components_failed: self.components_failed,
            births: self.births.len(),
            duplications: self.duplications.len(),
            loss_sites: self.losses.len(),
            loss_events: self.loss_events(),
            ortholog_groups: self.groups.len(),
            total_substitutions: self.total_substitutions,
            elapsed_ms,
        }
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub families: usize,
    pub components_succeeded: usize,
    pub components_failed: usize,
    pub births: usize,
    pub duplications: usize,
    pub loss_sites: usize,
    pub loss_events: usize,
    pub ortholog_groups: usize,
    pub total_substitutions: usize,
    pub elapsed_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(events: Vec<ReconciliationEvent>) -> ComponentResult {
        ComponentResult {
            family: 0,
            genes: 2,
            layers: 1,
            strategy: LabelingStrategy::NodeCentric,
            total_substitutions: 1,
            reconciliation: Reconciliation {
                events,
                groups: Vec::new(),
            },
        }
    }

    #[test]
    fn test_absorb_counts_events() {
        let mut results = RunResults::default();
        results.absorb(component(vec![
            ReconciliationEvent::Birth("a".to_string()),
            ReconciliationEvent::Birth("a".to_string()),
            ReconciliationEvent::Loss(LossSite::Species(1)),
            ReconciliationEvent::Loss(LossSite::Species(1)),
            ReconciliationEvent::Duplication("b".to_string()),
        ]));

        assert_eq!(results.births.len(), 1);
        assert_eq!(results.duplications.len(), 1);
        assert_eq!(results.losses.get(&LossSite::Species(1)), Some(&2));
        assert_eq!(results.components_succeeded, 1);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut a = RunResults::default();
        a.absorb(component(vec![ReconciliationEvent::Loss(LossSite::Ancestor(0))]));
        a.families = 1;
        let mut b = RunResults::default();
        b.absorb(component(vec![
            ReconciliationEvent::Loss(LossSite::Ancestor(0)),
            ReconciliationEvent::Birth("x".to_string()),
        ]));
        b.record_failure();
        b.families = 1;

        let mut ab = RunResults::default();
        ab.merge(a.clone());
        ab.merge(b.clone());
        let mut ba = RunResults::default();
        ba.merge(b);
        ba.merge(a);

        assert_eq!(ab, ba);
        assert_eq!(ab.loss_events(), 2);
        assert_eq!(ab.components_failed, 1);

        let summary = ab.summary(5);
        assert_eq!(summary.families, 2);
        assert_eq!(summary.loss_sites, 1);
        assert_eq!(summary.births, 1);
    }
}
