//! Convergence Detector
//!
//! Decides when the generational loop stops. Works over a trailing window
//! of recent generations and compares best aggregate scores, so noisy or
//! partially-failed generations only delay the verdict instead of
//! corrupting it.

use serde::{Deserialize, Serialize};

use crate::optimizer::candidate::History;

/// Lifecycle of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Seed created, generational loop not yet entered.
    Initialized,
    /// Generational loop in progress.
    Evolving,
    /// Improvement rate fell below the threshold.
    Converged,
    /// Generation cap or time budget ended the run first.
    MaxGenerationsReached,
    /// Outcome assembled and handed back to the caller.
    Completed,
}

pub const DEFAULT_CONVERGENCE_WINDOW: u32 = 3;
pub const DEFAULT_MIN_WINDOW_CANDIDATES: usize = 10;
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.05;

/// The first check only runs once this many generations have completed,
/// so a run is never declared converged on too little data.
const MIN_GENERATIONS_BEFORE_CHECK: u32 = 3;

#[derive(Debug)]
pub struct ConvergenceDetector {
    window: u32,
    min_candidates: usize,
    threshold: f64,
    last_rate: Option<f64>,
}

impl ConvergenceDetector {
    pub fn new(window: u32, min_candidates: usize, threshold: f64) -> Self {
        debug_assert!(
            window >= DEFAULT_CONVERGENCE_WINDOW,
            "convergence window must be >= {DEFAULT_CONVERGENCE_WINDOW}"
        );
        Self {
            window,
            min_candidates,
            threshold,
            last_rate: None,
        }
    }

    /// Check the run as of the just-completed `generation`. Returns true
    /// when the improvement rate over the trailing window has fallen below
    /// the threshold.
    pub fn check(&mut self, history: &History, generation: u32) -> bool {
        if generation < MIN_GENERATIONS_BEFORE_CHECK {
            return false;
        }
        // Not enough completed generations to fill the window yet
        if generation + 1 < self.window {
            return false;
        }

        let newest = generation;
        let oldest = generation + 1 - self.window;

        if history.evaluated_in_range(oldest, newest) < self.min_candidates {
            return false;
        }

        let (Some(oldest_best), Some(newest_best)) = (
            history.generation_best(oldest),
            history.generation_best(newest),
        ) else {
            // A boundary generation with no scored candidate: not enough
            // signal to call the run either way.
            return false;
        };

        let rate = if oldest_best > f64::EPSILON {
            (newest_best - oldest_best) / oldest_best
        } else if newest_best > f64::EPSILON {
            f64::INFINITY
        } else {
            0.0
        };
        self.last_rate = Some(rate);

        rate < self.threshold
    }

    /// Most recently computed improvement rate, 0.0 before any check ran.
    pub fn last_rate(&self) -> f64 {
        self.last_rate.unwrap_or(0.0)
    }
}

impl Default for ConvergenceDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONVERGENCE_WINDOW,
            DEFAULT_MIN_WINDOW_CANDIDATES,
            DEFAULT_CONVERGENCE_THRESHOLD,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::candidate::Candidate;
    use crate::optimizer::metrics::MetricsVector;

    fn fill_generation(history: &mut History, generation: u32, count: usize, accuracy: f64) {
        let seed = Candidate::seed("s");
        for _ in 0..count {
            let m = MetricsVector::try_new(accuracy, 0.5, 0.5, 0.5).unwrap();
            history.push(Candidate::offspring(&seed, "t", "m", generation).with_metrics(m));
        }
    }

    #[test]
    fn test_no_check_before_generation_three() {
        let mut detector = ConvergenceDetector::default();
        let mut history = History::new();
        fill_generation(&mut history, 1, 20, 0.8);
        fill_generation(&mut history, 2, 20, 0.8);
        assert!(!detector.check(&history, 2));
    }

    #[test]
    fn test_flat_scores_converge() {
        let mut detector = ConvergenceDetector::default();
        let mut history = History::new();
        for g in 1..=3 {
            fill_generation(&mut history, g, 5, 0.8);
        }
        assert!(detector.check(&history, 3));
        assert_eq!(detector.last_rate(), 0.0);
    }

    #[test]
    fn test_steady_improvement_keeps_evolving() {
        let mut detector = ConvergenceDetector::default();
        let mut history = History::new();
        fill_generation(&mut history, 1, 5, 0.2);
        fill_generation(&mut history, 2, 5, 0.4);
        fill_generation(&mut history, 3, 5, 0.6);
        assert!(!detector.check(&history, 3));
        assert!(detector.last_rate() > 0.05);
    }

    #[test]
    fn test_sparse_window_defers_verdict() {
        let mut detector = ConvergenceDetector::default();
        let mut history = History::new();
        for g in 1..=3 {
            fill_generation(&mut history, g, 2, 0.8);
        }
        // Only 6 evaluated candidates in the window, below the minimum of 10
        assert!(!detector.check(&history, 3));
    }

    #[test]
    fn test_unscored_boundary_generation_defers_verdict() {
        let mut detector = ConvergenceDetector::default();
        let mut history = History::new();
        fill_generation(&mut history, 1, 10, 0.8);
        fill_generation(&mut history, 2, 10, 0.8);
        // Generation 3 exists but nothing in it was scored
        let seed = Candidate::seed("s");
        history.push(Candidate::offspring(&seed, "t", "m", 3));
        assert!(!detector.check(&history, 3));
    }

    #[test]
    fn test_window_wider_than_completed_generations_defers_verdict() {
        let mut detector = ConvergenceDetector::new(5, 1, 0.05);
        let mut history = History::new();
        for g in 1..=3 {
            fill_generation(&mut history, g, 5, 0.8);
        }
        // Only 3 generations exist; a 5-wide window cannot be filled yet
        assert!(!detector.check(&history, 3));
        assert_eq!(detector.last_rate(), 0.0);

        fill_generation(&mut history, 4, 5, 0.8);
        fill_generation(&mut history, 5, 5, 0.8);
        assert!(detector.check(&history, 5));
    }

    #[test]
    #[should_panic(expected = "convergence window must be")]
    fn test_window_below_minimum_is_rejected() {
        ConvergenceDetector::new(2, 1, 0.05);
    }

    #[test]
    fn test_run_phase_serializes_snake_case() {
        let phases = [
            RunPhase::Initialized,
            RunPhase::Evolving,
            RunPhase::Converged,
            RunPhase::MaxGenerationsReached,
            RunPhase::Completed,
        ];
        let json = serde_json::to_string(&phases).unwrap();
        assert_eq!(
            json,
            r#"["initialized","evolving","converged","max_generations_reached","completed"]"#
        );
    }

    #[test]
    fn test_zero_baseline_with_gain_is_not_converged() {
        let mut detector = ConvergenceDetector::default();
        let mut history = History::new();
        let seed = Candidate::seed("s");
        for _ in 0..5 {
            let zero = MetricsVector::try_new(0.0, 0.0, 0.0, 0.0).unwrap();
            history.push(Candidate::offspring(&seed, "t", "m", 1).with_metrics(zero));
        }
        fill_generation(&mut history, 2, 5, 0.3);
        fill_generation(&mut history, 3, 5, 0.6);
        assert!(!detector.check(&history, 3));
    }
}
