//! Mutation Collaborator
//!
//! Produces a new candidate text from a parent. The LLM-backed mutator
//! falls back to a deterministic local augmentation on any failure, so a
//! broken or offline collaborator can never abort a run.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::collaborators::provider::LlmProvider;

/// Appended to the parent text by the deterministic fallback.
pub const IMPROVEMENT_DIRECTIVE: &str =
    "Be precise and specific: state assumptions, ground every claim in the \
     given context, and present the result explicitly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    SemanticExpansion,
    InstructionRefinement,
    ExampleAddition,
    ConstraintAddition,
    StyleModification,
}

impl MutationKind {
    /// Ordered from conservative to exploratory; the diversity knob
    /// decides how deep into this list the mutator may reach.
    pub const ALL: [MutationKind; 5] = [
        MutationKind::InstructionRefinement,
        MutationKind::StyleModification,
        MutationKind::ConstraintAddition,
        MutationKind::ExampleAddition,
        MutationKind::SemanticExpansion,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            MutationKind::SemanticExpansion => "semantic_expansion",
            MutationKind::InstructionRefinement => "instruction_refinement",
            MutationKind::ExampleAddition => "example_addition",
            MutationKind::ConstraintAddition => "constraint_addition",
            MutationKind::StyleModification => "style_modification",
        }
    }

    fn instruction(&self, parent: &str) -> String {
        let task = match self {
            MutationKind::SemanticExpansion => {
                "Expand it with additional semantic context, clarifications and detail \
                 so it covers the problem more comprehensively."
            }
            MutationKind::InstructionRefinement => {
                "Refine it so the instructions are more precise, specific and actionable."
            }
            MutationKind::ExampleAddition => {
                "Add 2-3 concrete examples that illustrate the expected behavior."
            }
            MutationKind::ConstraintAddition => {
                "Add safety, quality and scope constraints that improve reliability."
            }
            MutationKind::StyleModification => {
                "Adjust the tone and style to be more professional and concise."
            }
        };
        format!(
            "Improve the following text.\n\nOriginal:\n{parent}\n\n{task}\n\n\
             Reply with the improved text only, no commentary."
        )
    }
}

/// The result of one mutation: the child text plus the lineage entry
/// describing how it was produced.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub text: String,
    pub description: String,
}

/// Mutation boundary contract: infallible from the caller's perspective.
/// Recoverable failures must be absorbed internally.
#[async_trait]
pub trait Mutator: Send + Sync {
    /// `diversity` in (0, 1] controls how broad the pool of mutation kinds
    /// is; implementations may ignore it.
    async fn mutate(&self, parent_text: &str, diversity: f64) -> Mutation;
}

/// Deterministic local fallback: appends a fixed improvement directive.
pub struct DirectiveMutator;

#[async_trait]
impl Mutator for DirectiveMutator {
    async fn mutate(&self, parent_text: &str, _diversity: f64) -> Mutation {
        let text = if parent_text.contains(IMPROVEMENT_DIRECTIVE) {
            parent_text.to_string()
        } else {
            format!("{}\n\n{}", parent_text.trim_end(), IMPROVEMENT_DIRECTIVE)
        };
        Mutation {
            text,
            description: "directive_fallback".to_string(),
        }
    }
}

/// LLM-backed mutator. Picks a mutation kind, asks the provider for the
/// rewrite, and degrades to [`DirectiveMutator`] on any failure.
pub struct LlmMutator {
    provider: Arc<dyn LlmProvider>,
    fallback: DirectiveMutator,
    rng: Mutex<StdRng>,
}

impl LlmMutator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            fallback: DirectiveMutator,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    fn pick_kind(&self, diversity: f64) -> MutationKind {
        // Low diversity sticks to refinement-style edits; high diversity
        // draws from the whole pool.
        let pool = 1 + (diversity.clamp(0.0, 1.0) * (MutationKind::ALL.len() - 1) as f64)
            .round() as usize;
        let idx = self
            .rng
            .lock()
            .map(|mut rng| rng.gen_range(0..pool))
            .unwrap_or(0);
        MutationKind::ALL[idx]
    }
}

#[async_trait]
impl Mutator for LlmMutator {
    async fn mutate(&self, parent_text: &str, diversity: f64) -> Mutation {
        let kind = self.pick_kind(diversity);
        let prompt = kind.instruction(parent_text);

        match self.provider.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => Mutation {
                text: text.trim().to_string(),
                description: kind.describe().to_string(),
            },
            Ok(_) => {
                warn!("Mutation produced empty output, using fallback directive");
                self.fallback.mutate(parent_text, diversity).await
            }
            Err(e) => {
                warn!("Mutation collaborator failed ({e}), using fallback directive");
                self.fallback.mutate(parent_text, diversity).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FailingProvider;

    #[async_trait]
    impl LlmProvider for FailingProvider {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow!("connection refused"))
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok("  rewritten text  ".to_string())
        }
    }

    #[tokio::test]
    async fn test_directive_mutator_appends_once() {
        let mutation = DirectiveMutator.mutate("Solve this problem", 0.5).await;
        assert!(mutation.text.starts_with("Solve this problem"));
        assert!(mutation.text.contains(IMPROVEMENT_DIRECTIVE));

        let again = DirectiveMutator.mutate(&mutation.text, 0.5).await;
        assert_eq!(again.text.matches(IMPROVEMENT_DIRECTIVE).count(), 1);
    }

    #[tokio::test]
    async fn test_llm_mutator_falls_back_on_provider_failure() {
        let mutator = LlmMutator::new(Arc::new(FailingProvider)).with_seed(7);
        let mutation = mutator.mutate("Solve this problem", 0.5).await;
        assert_eq!(mutation.description, "directive_fallback");
        assert!(mutation.text.contains(IMPROVEMENT_DIRECTIVE));
    }

    #[tokio::test]
    async fn test_llm_mutator_trims_provider_output() {
        let mutator = LlmMutator::new(Arc::new(EchoProvider)).with_seed(7);
        let mutation = mutator.mutate("Solve this problem", 1.0).await;
        assert_eq!(mutation.text, "rewritten text");
        assert_ne!(mutation.description, "directive_fallback");
    }

    #[test]
    fn test_kind_pool_narrows_with_low_diversity() {
        let mutator = LlmMutator::new(Arc::new(EchoProvider)).with_seed(7);
        for _ in 0..50 {
            assert_eq!(mutator.pick_kind(0.0), MutationKind::InstructionRefinement);
        }
    }
}
