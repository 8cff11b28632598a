//! GEPA Demo Runner
//!
//! Runs one optimization round end to end. Offline by default (heuristic
//! collaborators); set GEPA_USE_OLLAMA=1 to mutate and judge through a
//! local Ollama instance.

use anyhow::Result;
use ollama_rs::Ollama;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gepa::{
    DirectiveMutator, EvalExample, Evaluator, GepaOptimizer, HeuristicEvaluator, LlmEvaluator,
    LlmMutator, Mutator, OllamaProvider, OptimizerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    println!("\n{}", "═".repeat(60));
    println!("🧬 GEPA Genetic-Pareto Optimizer v0.2.0");
    println!("{}", "═".repeat(60));
    println!("Features: Pareto Front | Reflective Mutation | Convergence Detection");
    println!("{}\n", "═".repeat(60));

    let (mutator, evaluator): (Arc<dyn Mutator>, Arc<dyn Evaluator>) =
        if std::env::var("GEPA_USE_OLLAMA").is_ok() {
            let model =
                std::env::var("GEPA_MODEL").unwrap_or_else(|_| "llama3.1:8b".to_string());
            info!("Using Ollama collaborators with model {model}");
            let provider = Arc::new(OllamaProvider::new(Ollama::default(), model));
            (
                Arc::new(LlmMutator::new(provider.clone())),
                Arc::new(LlmEvaluator::new(provider)),
            )
        } else {
            info!("Using offline heuristic collaborators");
            (Arc::new(DirectiveMutator), Arc::new(HeuristicEvaluator))
        };

    let eval_data = vec![
        EvalExample {
            input: "current inventory levels for the east warehouse".to_string(),
            expected: "a reorder threshold report with per-item counts".to_string(),
        },
        EvalExample {
            input: "supplier lead times for Q3".to_string(),
            expected: "a ranked list of suppliers by average lead time".to_string(),
        },
    ];

    let seed = "You are an assistant for inventory operations. \
                Answer questions using the provided context.";

    let optimizer = GepaOptimizer::new(mutator, evaluator).with_config(OptimizerConfig {
        population_size: 10,
        ..OptimizerConfig::default()
    });

    let outcome = optimizer.optimize(seed, &eval_data, 10).await?;

    println!("\nRun stopped: {:?}", outcome.stop);
    println!("Generations: {}", outcome.metrics.evolution_generation);
    println!("Candidates evaluated: {}", outcome.evolution_history.len());
    println!("Pareto front size: {}", outcome.metrics.pareto_front_size);
    println!("Best aggregate score: {:.3}", outcome.metrics.optimization_score);
    println!("Convergence rate: {:.4}", outcome.metrics.convergence_rate);
    println!("\nBest candidate:\n{}", outcome.best_candidate.text);

    Ok(())
}
