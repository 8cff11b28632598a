//! Metrics Vector
//!
//! Four bounded quality scores and the dominance relation built on them.

use serde::{Deserialize, Serialize};

use crate::optimizer::error::OptimizerError;

/// Four independent quality scores, each in the closed interval [0, 1].
///
/// No aggregate is stored; the mean is computed on demand for ranking and
/// reporting and is never consulted by the dominance relation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsVector {
    pub accuracy: f64,
    pub efficiency: f64,
    pub relevance: f64,
    pub coherence: f64,
}

impl MetricsVector {
    /// Build a vector from raw scores. Finite values are clamped into
    /// [0, 1]; NaN or infinite input is an evaluation failure.
    pub fn try_new(
        accuracy: f64,
        efficiency: f64,
        relevance: f64,
        coherence: f64,
    ) -> Result<Self, OptimizerError> {
        let bound = |name: &str, v: f64| -> Result<f64, OptimizerError> {
            if !v.is_finite() {
                return Err(OptimizerError::Evaluation(format!(
                    "non-finite {name} score: {v}"
                )));
            }
            Ok(v.clamp(0.0, 1.0))
        };

        Ok(Self {
            accuracy: bound("accuracy", accuracy)?,
            efficiency: bound("efficiency", efficiency)?,
            relevance: bound("relevance", relevance)?,
            coherence: bound("coherence", coherence)?,
        })
    }

    fn components(&self) -> [f64; 4] {
        [self.accuracy, self.efficiency, self.relevance, self.coherence]
    }

    /// Arithmetic mean of the four scores. Ranking/reporting only.
    pub fn aggregate(&self) -> f64 {
        let c = self.components();
        (c[0] + c[1] + c[2] + c[3]) / 4.0
    }

    /// True iff `self` is at least as good as `other` on every dimension
    /// and strictly better on at least one. Irreflexive and antisymmetric;
    /// equal vectors are mutually non-dominating.
    pub fn dominates(&self, other: &MetricsVector) -> bool {
        let mut better_in_any = false;
        for (a, b) in self.components().iter().zip(other.components().iter()) {
            if a < b {
                return false;
            }
            if a > b {
                better_in_any = true;
            }
        }
        better_in_any
    }
}
