//! Candidate Entity and Run History
//!
//! Candidates are immutable once evaluated. The history is append-only and
//! resolves parent back-references through an id lookup table, never through
//! object links, so lineage stays acyclic and serializable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::optimizer::metrics::MetricsVector;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub text: String,
    /// Absent until the evaluation collaborator has scored this candidate.
    pub metrics: Option<MetricsVector>,
    pub generation: u32,
    /// Lookup-only back-reference into the run history.
    pub parent_id: Option<String>,
    /// Mutation descriptions applied from the seed down to this candidate.
    pub lineage: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    /// The generation-0 candidate a run starts from.
    pub fn seed(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            metrics: None,
            generation: 0,
            parent_id: None,
            lineage: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// A child produced by the mutation collaborator.
    pub fn offspring(
        parent: &Candidate,
        text: impl Into<String>,
        mutation: impl Into<String>,
        generation: u32,
    ) -> Self {
        let mut lineage = parent.lineage.clone();
        lineage.push(mutation.into());
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            metrics: None,
            generation,
            parent_id: Some(parent.id.clone()),
            lineage,
            created_at: Utc::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsVector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_evaluated(&self) -> bool {
        self.metrics.is_some()
    }

    pub fn aggregate(&self) -> Option<f64> {
        self.metrics.map(|m| m.aggregate())
    }
}

/// Append-only record of every candidate ever created in a run, dominated
/// and rejected ones included.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.index.insert(candidate.id.clone(), self.entries.len());
        self.entries.push(candidate);
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn parent_of(&self, candidate: &Candidate) -> Option<&Candidate> {
        candidate.parent_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn entries(&self) -> &[Candidate] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Candidate> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-aggregate evaluated candidate across the whole run.
    pub fn best_evaluated(&self) -> Option<&Candidate> {
        self.entries
            .iter()
            .filter(|c| c.is_evaluated())
            .max_by(|a, b| {
                a.aggregate()
                    .partial_cmp(&b.aggregate())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Best aggregate among evaluated candidates of one generation.
    pub fn generation_best(&self, generation: u32) -> Option<f64> {
        self.entries
            .iter()
            .filter(|c| c.generation == generation)
            .filter_map(|c| c.aggregate())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Number of evaluated candidates whose generation lies in the
    /// inclusive range.
    pub fn evaluated_in_range(&self, from: u32, to: u32) -> usize {
        self.entries
            .iter()
            .filter(|c| c.generation >= from && c.generation <= to && c.is_evaluated())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(a: f64) -> MetricsVector {
        MetricsVector::try_new(a, 0.5, 0.5, 0.5).unwrap()
    }

    #[test]
    fn test_offspring_extends_lineage() {
        let seed = Candidate::seed("base");
        let child = Candidate::offspring(&seed, "base v2", "instruction_refinement", 1);
        let grandchild = Candidate::offspring(&child, "base v3", "example_addition", 2);

        assert_eq!(child.parent_id.as_deref(), Some(seed.id.as_str()));
        assert_eq!(
            grandchild.lineage,
            vec!["instruction_refinement", "example_addition"]
        );
        assert_eq!(grandchild.generation, 2);
    }

    #[test]
    fn test_history_lookup_resolves_parents() {
        let mut history = History::new();
        let seed = Candidate::seed("base");
        let child = Candidate::offspring(&seed, "base v2", "style_modification", 1);
        history.push(seed.clone());
        history.push(child.clone());

        let resolved = history.parent_of(&child).unwrap();
        assert_eq!(resolved.id, seed.id);
        assert!(history.parent_of(&seed).is_none());
    }

    #[test]
    fn test_best_evaluated_ignores_unscored() {
        let mut history = History::new();
        history.push(Candidate::seed("unscored"));
        history.push(Candidate::seed("low").with_metrics(scored(0.2)));
        history.push(Candidate::seed("high").with_metrics(scored(0.9)));

        assert_eq!(history.best_evaluated().unwrap().text, "high");
    }

    #[test]
    fn test_window_counts_skip_unscored() {
        let mut history = History::new();
        let seed = Candidate::seed("s");
        for g in 1..=3 {
            let mut c = Candidate::offspring(&seed, "t", "m", g);
            if g != 2 {
                c = c.with_metrics(scored(0.5));
            }
            history.push(c);
        }
        assert_eq!(history.evaluated_in_range(1, 3), 2);
        assert!(history.generation_best(2).is_none());
    }
}
