//! Optimizer Core
//!
//! Pareto-based evolutionary optimization: data model, dominance, front
//! tracking, convergence detection, reflection, and the orchestrating loop.

mod candidate;
mod convergence;
mod engine;
mod error;
mod metrics;
mod pareto;
mod reflection;

pub use candidate::{Candidate, History};
pub use convergence::{ConvergenceDetector, RunPhase};
pub use engine::{GepaOptimizer, OptimizationMetrics, OptimizationOutcome, OptimizerConfig};
pub use error::OptimizerError;
pub use metrics::MetricsVector;
pub use pareto::ParetoFront;
pub use reflection::{MutationStrategy, ReflectiveAnalyzer, StrategyAdjustment};
