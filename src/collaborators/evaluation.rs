//! Evaluation Collaborator
//!
//! The sole source of truth for candidate quality. The LLM-backed judge
//! parses a JSON score object out of the model response; the heuristic
//! evaluator scores deterministic text features for offline runs and empty
//! datasets. Evaluation failure has no safe fallback: a failed candidate is
//! simply never absorbed into the front.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::collaborators::provider::LlmProvider;
use crate::optimizer::{MetricsVector, OptimizerError};

/// One labelled example a candidate is judged against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalExample {
    pub input: String,
    pub expected: String,
}

/// Evaluation boundary contract: a full four-component vector in [0,1],
/// or a per-candidate failure. Never a partial vector, never invented
/// scores.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        text: &str,
        dataset: &[EvalExample],
    ) -> Result<MetricsVector, OptimizerError>;
}

#[derive(Deserialize)]
struct RawScores {
    accuracy: f64,
    efficiency: f64,
    relevance: f64,
    coherence: f64,
}

/// LLM-as-judge evaluator.
pub struct LlmEvaluator {
    provider: Arc<dyn LlmProvider>,
}

impl LlmEvaluator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    fn render_prompt(text: &str, dataset: &[EvalExample]) -> String {
        let examples = if dataset.is_empty() {
            "(none provided)".to_string()
        } else {
            dataset
                .iter()
                .take(10)
                .map(|e| format!("- input: {} / expected: {}", e.input, e.expected))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "Score the following candidate text on four dimensions, each in [0, 1].\n\n\
             Candidate:\n{text}\n\nEvaluation examples:\n{examples}\n\n\
             Reply with JSON ONLY:\n\
             {{ \"accuracy\": 0.0, \"efficiency\": 0.0, \"relevance\": 0.0, \"coherence\": 0.0 }}"
        )
    }

    /// Pull the first JSON object out of a possibly chatty model response.
    fn parse_scores(response: &str) -> Result<MetricsVector, OptimizerError> {
        let start = response
            .find('{')
            .ok_or_else(|| OptimizerError::Evaluation("no JSON object in judge response".into()))?;
        let end = response
            .rfind('}')
            .ok_or_else(|| OptimizerError::Evaluation("unterminated JSON in judge response".into()))?;
        if end < start {
            return Err(OptimizerError::Evaluation(
                "malformed JSON in judge response".into(),
            ));
        }

        let raw: RawScores = serde_json::from_str(&response[start..=end])
            .map_err(|e| OptimizerError::Evaluation(format!("unparsable judge scores: {e}")))?;

        MetricsVector::try_new(raw.accuracy, raw.efficiency, raw.relevance, raw.coherence)
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        text: &str,
        dataset: &[EvalExample],
    ) -> Result<MetricsVector, OptimizerError> {
        let prompt = Self::render_prompt(text, dataset);
        let response = self
            .provider
            .complete(&prompt)
            .await
            .map_err(|e| OptimizerError::Evaluation(format!("judge call failed: {e}")))?;

        debug!("Judge response: {}", response);
        Self::parse_scores(&response)
    }
}

/// Deterministic offline evaluator over surface features of the text.
/// Intentionally not random: the same text and dataset always score the
/// same, which keeps runs reproducible and testable.
pub struct HeuristicEvaluator;

impl HeuristicEvaluator {
    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(|t| t.to_lowercase())
            .collect()
    }

    /// Fraction of dataset rows whose expected-output tokens overlap the
    /// candidate text. Structural proxy when no dataset exists.
    fn accuracy(text: &str, dataset: &[EvalExample]) -> f64 {
        if dataset.is_empty() {
            let directives = ["must", "verify", "specific", "step", "precise", "explicit"];
            let toks = Self::tokens(text);
            let hits = directives.iter().filter(|d| toks.iter().any(|t| t == *d)).count();
            return 0.4 + 0.1 * hits.min(6) as f64;
        }
        let toks = Self::tokens(text);
        let covered = dataset
            .iter()
            .filter(|e| {
                Self::tokens(&e.expected)
                    .iter()
                    .any(|t| toks.contains(t))
            })
            .count();
        covered as f64 / dataset.len() as f64
    }

    /// Concise texts score higher; saturates towards zero around 800 words.
    fn efficiency(text: &str) -> f64 {
        let words = text.split_whitespace().count() as f64;
        (1.0 - words / 800.0).clamp(0.05, 1.0)
    }

    /// Overlap with dataset inputs, or lexical variety when none exist.
    fn relevance(text: &str, dataset: &[EvalExample]) -> f64 {
        let toks = Self::tokens(text);
        if toks.is_empty() {
            return 0.0;
        }
        if dataset.is_empty() {
            let unique: std::collections::HashSet<&String> = toks.iter().collect();
            return unique.len() as f64 / toks.len() as f64;
        }
        let covered = dataset
            .iter()
            .filter(|e| Self::tokens(&e.input).iter().any(|t| toks.contains(t)))
            .count();
        covered as f64 / dataset.len() as f64
    }

    /// Sentences in a readable 8-25 word band read as coherent.
    fn coherence(text: &str) -> f64 {
        let sentences: Vec<&str> = text
            .split(['.', '!', '?', '\n'])
            .filter(|s| !s.trim().is_empty())
            .collect();
        if sentences.is_empty() {
            return 0.0;
        }
        let readable = sentences
            .iter()
            .filter(|s| {
                let words = s.split_whitespace().count();
                (3..=25).contains(&words)
            })
            .count();
        readable as f64 / sentences.len() as f64
    }
}

#[async_trait]
impl Evaluator for HeuristicEvaluator {
    async fn evaluate(
        &self,
        text: &str,
        dataset: &[EvalExample],
    ) -> Result<MetricsVector, OptimizerError> {
        MetricsVector::try_new(
            Self::accuracy(text, dataset),
            Self::efficiency(text),
            Self::relevance(text, dataset),
            Self::coherence(text),
        )
    }
}
