//! GEPA — Genetic-Pareto Reflective Optimizer
//!
//! Evolves a text candidate (a prompt, instruction or configuration string)
//! against four competing quality metrics with:
//! - Pareto dominance and a bounded non-dominated front
//! - LLM-backed mutation with a deterministic local fallback
//! - Pluggable evaluation collaborators (LLM judge or offline heuristics)
//! - Windowed convergence detection
//! - A reflective feedback hook steering mutation diversity

pub mod collaborators;
pub mod optimizer;

// Re-exports for convenience
pub use collaborators::{
    DirectiveMutator, EvalExample, Evaluator, HeuristicEvaluator, LlmEvaluator, LlmMutator,
    LlmProvider, Mutator, OllamaProvider, OpenAiCompatProvider,
};
pub use optimizer::{
    Candidate, GepaOptimizer, MetricsVector, OptimizationMetrics, OptimizationOutcome,
    OptimizerConfig, OptimizerError, ParetoFront, RunPhase,
};
