//! Pareto Front Tracker
//!
//! Maintains the bounded non-dominated subset of all evaluated candidates.
//! When more non-dominated candidates exist than the cap allows, the front
//! keeps the highest-aggregate members. That tie-break narrows true
//! Pareto-optimality and is kept as a deliberate simplification.

use std::cmp::Ordering;

use crate::optimizer::candidate::Candidate;
use crate::optimizer::error::OptimizerError;

pub const DEFAULT_FRONT_CAPACITY: usize = 10;

#[derive(Debug)]
pub struct ParetoFront {
    members: Vec<Candidate>,
    capacity: usize,
}

impl ParetoFront {
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Absorb an evaluated candidate.
    ///
    /// Members dominated by the newcomer are evicted; the newcomer enters
    /// only if no survivor dominates it. A candidate already present (same
    /// id) or carrying metrics identical to an existing member's is a no-op,
    /// which makes `update` idempotent and keeps redundant twins out.
    ///
    /// Returns whether the candidate is a front member afterwards. Offering
    /// an unevaluated candidate is a contract violation.
    pub fn update(&mut self, candidate: &Candidate) -> Result<bool, OptimizerError> {
        let metrics = candidate
            .metrics
            .ok_or_else(|| OptimizerError::UnevaluatedCandidate(candidate.id.clone()))?;

        if self.members.iter().any(|m| m.id == candidate.id) {
            return Ok(true);
        }
        if self
            .members
            .iter()
            .any(|m| m.metrics.is_some_and(|existing| existing == metrics))
        {
            return Ok(false);
        }

        self.members.retain(|m| {
            !m.metrics
                .map(|existing| metrics.dominates(&existing))
                .unwrap_or(false)
        });

        let dominated = self
            .members
            .iter()
            .any(|m| m.metrics.is_some_and(|existing| existing.dominates(&metrics)));
        if dominated {
            return Ok(false);
        }

        self.members.push(candidate.clone());

        if self.members.len() > self.capacity {
            self.members.sort_by(|a, b| {
                b.aggregate()
                    .partial_cmp(&a.aggregate())
                    .unwrap_or(Ordering::Equal)
            });
            self.members.truncate(self.capacity);
        }

        Ok(self.members.iter().any(|m| m.id == candidate.id))
    }

    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Highest-aggregate member.
    pub fn best(&self) -> Option<&Candidate> {
        self.members.iter().max_by(|a, b| {
            a.aggregate()
                .partial_cmp(&b.aggregate())
                .unwrap_or(Ordering::Equal)
        })
    }

    /// Up to `n` members, ranked by descending aggregate score.
    pub fn top_ranked(&self, n: usize) -> Vec<&Candidate> {
        let mut ranked: Vec<&Candidate> = self.members.iter().collect();
        ranked.sort_by(|a, b| {
            b.aggregate()
                .partial_cmp(&a.aggregate())
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(n);
        ranked
    }
}

impl Default for ParetoFront {
    fn default() -> Self {
        Self::new(DEFAULT_FRONT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::metrics::MetricsVector;

    fn candidate(a: f64, e: f64, r: f64, c: f64) -> Candidate {
        Candidate::seed("t").with_metrics(MetricsVector::try_new(a, e, r, c).unwrap())
    }

    fn assert_no_dominated_pair(front: &ParetoFront) {
        for a in front.members() {
            for b in front.members() {
                let (ma, mb) = (a.metrics.unwrap(), b.metrics.unwrap());
                assert!(
                    !(ma.dominates(&mb) || mb.dominates(&ma)) || a.id == b.id,
                    "front holds an internally dominated pair"
                );
            }
        }
    }

    #[test]
    fn test_dominated_newcomer_rejected() {
        let mut front = ParetoFront::default();
        front.update(&candidate(0.9, 0.9, 0.9, 0.9)).unwrap();
        let admitted = front.update(&candidate(0.1, 0.1, 0.1, 0.1)).unwrap();
        assert!(!admitted);
        assert_eq!(front.len(), 1);
    }

    #[test]
    fn test_newcomer_evicts_dominated_members() {
        let mut front = ParetoFront::default();
        front.update(&candidate(0.3, 0.3, 0.3, 0.3)).unwrap();
        front.update(&candidate(0.4, 0.2, 0.3, 0.3)).unwrap();
        front.update(&candidate(0.9, 0.9, 0.9, 0.9)).unwrap();
        assert_eq!(front.len(), 1);
        assert_no_dominated_pair(&front);
    }

    #[test]
    fn test_incomparable_members_coexist() {
        let mut front = ParetoFront::default();
        front.update(&candidate(0.9, 0.1, 0.5, 0.5)).unwrap();
        front.update(&candidate(0.1, 0.9, 0.5, 0.5)).unwrap();
        assert_eq!(front.len(), 2);
        assert_no_dominated_pair(&front);
    }

    #[test]
    fn test_capacity_truncates_by_aggregate() {
        let mut front = ParetoFront::new(3);
        // Mutually incomparable points with distinct aggregates
        for i in 0..6 {
            let hi = 0.9 - 0.1 * i as f64;
            let lo = 0.2 + 0.1 * i as f64;
            front.update(&candidate(hi, lo, 0.5, 0.5)).unwrap();
        }
        assert_eq!(front.len(), 3);
        assert_no_dominated_pair(&front);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut front = ParetoFront::default();
        let c = candidate(0.6, 0.6, 0.6, 0.6);
        assert!(front.update(&c).unwrap());
        assert!(front.update(&c).unwrap());
        assert_eq!(front.len(), 1);
    }

    #[test]
    fn test_equal_metrics_twin_not_added() {
        let mut front = ParetoFront::default();
        front.update(&candidate(0.8, 0.8, 0.8, 0.8)).unwrap();
        let admitted = front.update(&candidate(0.8, 0.8, 0.8, 0.8)).unwrap();
        assert!(!admitted);
        assert_eq!(front.len(), 1);
    }

    #[test]
    fn test_unevaluated_candidate_is_contract_violation() {
        let mut front = ParetoFront::default();
        let raw = Candidate::seed("unscored");
        assert!(matches!(
            front.update(&raw),
            Err(OptimizerError::UnevaluatedCandidate(_))
        ));
    }

    #[test]
    fn test_top_ranked_orders_by_aggregate() {
        let mut front = ParetoFront::default();
        front.update(&candidate(0.9, 0.1, 0.5, 0.5)).unwrap();
        front.update(&candidate(0.1, 0.9, 0.6, 0.6)).unwrap();
        let top = front.top_ranked(1);
        assert_eq!(top.len(), 1);
        assert!((top[0].aggregate().unwrap() - 0.55).abs() < 1e-12);
    }
}
