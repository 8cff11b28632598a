//! Optimizer Error Taxonomy
//!
//! Only configuration errors and total-run failure ever reach the caller;
//! collaborator failures are recovered or isolated per candidate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizerError {
    /// Rejected at `optimize()` entry. Never silently corrected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every evaluation in the run failed, so there is no result to return.
    #[error("no viable candidate: no candidate was ever successfully evaluated")]
    NoViableCandidate,

    /// A candidate without metrics was offered to the Pareto front.
    #[error("candidate {0} has no metrics and cannot enter the Pareto front")]
    UnevaluatedCandidate(String),

    /// Per-candidate scoring failure. The affected candidate stays out of
    /// the front; the run itself continues.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}
