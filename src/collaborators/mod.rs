//! External Collaborators
//!
//! Adapter boundaries for the two opaque collaborators the optimizer
//! depends on: text mutation and candidate scoring.

mod evaluation;
mod mutation;
mod provider;

pub use evaluation::{EvalExample, Evaluator, HeuristicEvaluator, LlmEvaluator};
pub use mutation::{
    DirectiveMutator, LlmMutator, Mutation, MutationKind, Mutator, IMPROVEMENT_DIRECTIVE,
};
pub use provider::{LlmProvider, OllamaProvider, OpenAiCompatProvider};
