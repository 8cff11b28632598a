//! Optimization Orchestrator
//!
//! Drives the generational loop: seed, mutate, evaluate, absorb, reflect,
//! check convergence. Owns every piece of mutable run state; collaborators
//! are stateless trait objects. Child pipelines within a generation run
//! concurrently, but all Pareto front updates are folded sequentially on
//! this task, so the front is only ever written by a single writer.

use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::collaborators::{EvalExample, Evaluator, Mutator};
use crate::optimizer::candidate::{Candidate, History};
use crate::optimizer::convergence::{
    ConvergenceDetector, RunPhase, DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_CONVERGENCE_WINDOW,
    DEFAULT_MIN_WINDOW_CANDIDATES,
};
use crate::optimizer::error::OptimizerError;
use crate::optimizer::pareto::{ParetoFront, DEFAULT_FRONT_CAPACITY};
use crate::optimizer::reflection::{MutationStrategy, ReflectiveAnalyzer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Children produced per generation.
    pub population_size: usize,
    /// Improvement rate below which the run is converged, in (0, 1).
    pub convergence_threshold: f64,
    /// Pareto front size cap.
    pub front_capacity: usize,
    /// Parents sampled from the front's top-ranked subset each generation.
    pub parent_sample: usize,
    /// Trailing generations the convergence check looks at (>= 3).
    pub convergence_window: u32,
    /// Minimum evaluated candidates the window must hold before a verdict.
    pub min_window_candidates: usize,
    /// Concurrent mutate+evaluate pipelines per generation.
    pub max_concurrency: usize,
    /// Optional wall-clock budget; exhaustion ends the run with partial
    /// progress instead of an error.
    pub time_budget: Option<Duration>,
    /// Seed for parent sampling, for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            front_capacity: DEFAULT_FRONT_CAPACITY,
            parent_sample: 5,
            convergence_window: DEFAULT_CONVERGENCE_WINDOW,
            min_window_candidates: DEFAULT_MIN_WINDOW_CANDIDATES,
            max_concurrency: 8,
            time_budget: None,
            rng_seed: None,
        }
    }
}

impl OptimizerConfig {
    fn validate(&self, max_generations: u32) -> Result<(), OptimizerError> {
        if max_generations < 1 {
            return Err(OptimizerError::InvalidConfig(
                "max_generations must be >= 1".into(),
            ));
        }
        if self.population_size < 1 {
            return Err(OptimizerError::InvalidConfig(
                "population_size must be >= 1".into(),
            ));
        }
        if !(self.convergence_threshold > 0.0 && self.convergence_threshold < 1.0) {
            return Err(OptimizerError::InvalidConfig(
                "convergence_threshold must be in (0, 1)".into(),
            ));
        }
        if self.front_capacity < 1 {
            return Err(OptimizerError::InvalidConfig(
                "front_capacity must be >= 1".into(),
            ));
        }
        if self.parent_sample < 1 {
            return Err(OptimizerError::InvalidConfig(
                "parent_sample must be >= 1".into(),
            ));
        }
        if self.convergence_window < 3 {
            return Err(OptimizerError::InvalidConfig(
                "convergence_window must be >= 3".into(),
            ));
        }
        if self.max_concurrency < 1 {
            return Err(OptimizerError::InvalidConfig(
                "max_concurrency must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Summary figures for a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub reflection_depth: u32,
    /// Aggregate score of the best candidate.
    pub optimization_score: f64,
    /// Exhaustive evaluation budget divided by evaluations performed.
    pub efficiency_multiplier: f64,
    /// Final generation counter value.
    pub evolution_generation: u32,
    pub pareto_front_size: usize,
    /// Improvement rate from the last convergence check.
    pub convergence_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub best_candidate: Candidate,
    pub metrics: OptimizationMetrics,
    /// Every candidate the run ever created, in creation order.
    pub evolution_history: Vec<Candidate>,
    /// Converged or MaxGenerationsReached.
    pub stop: RunPhase,
}

pub struct GepaOptimizer {
    mutator: Arc<dyn Mutator>,
    evaluator: Arc<dyn Evaluator>,
    config: OptimizerConfig,
}

impl GepaOptimizer {
    pub fn new(mutator: Arc<dyn Mutator>, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            mutator,
            evaluator,
            config: OptimizerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run the full generational loop and return the best candidate found,
    /// summary metrics, and the complete evolution history.
    pub async fn optimize(
        &self,
        seed_text: &str,
        eval_data: &[EvalExample],
        max_generations: u32,
    ) -> Result<OptimizationOutcome, OptimizerError> {
        self.config.validate(max_generations)?;
        let started = Instant::now();

        info!(
            "🚀 Starting optimization: max_generations={}, population={}, threshold={}",
            max_generations, self.config.population_size, self.config.convergence_threshold
        );

        let mut history = History::new();
        let mut front = ParetoFront::new(self.config.front_capacity);
        let mut detector = ConvergenceDetector::new(
            self.config.convergence_window,
            self.config.min_window_candidates,
            self.config.convergence_threshold,
        );
        let mut analyzer = ReflectiveAnalyzer::new();
        let mut strategy = MutationStrategy::default();
        let mut rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut evaluations: usize = 0;

        let mut phase = RunPhase::Initialized;
        debug!("Run phase: {:?}", phase);

        // Generation 0: the seed candidate
        let mut seed = Candidate::seed(seed_text);
        match self.evaluator.evaluate(&seed.text, eval_data).await {
            Ok(m) => {
                evaluations += 1;
                seed = seed.with_metrics(m);
                front.update(&seed)?;
            }
            Err(e) => warn!("Seed evaluation failed, seed stays unscored: {e}"),
        }
        history.push(seed);

        phase = RunPhase::Evolving;
        let mut generation: u32 = 0;
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));

        for gen in 1..=max_generations {
            if let Some(budget) = self.config.time_budget {
                if started.elapsed() >= budget {
                    warn!("⏱️ Time budget exhausted at generation {gen}, returning partial progress");
                    phase = RunPhase::MaxGenerationsReached;
                    break;
                }
            }

            let parents = self.sample_parents(&front, &history, &mut rng);

            // Independent mutate+evaluate pipelines, bounded by the semaphore
            let mut tasks = Vec::with_capacity(self.config.population_size);
            for _ in 0..self.config.population_size {
                let parent = parents[rng.gen_range(0..parents.len())].clone();
                let mutator = self.mutator.clone();
                let evaluator = self.evaluator.clone();
                let sem = semaphore.clone();
                let data = eval_data.to_vec();
                let diversity = strategy.diversity;
                tasks.push(tokio::spawn(async move {
                    let _permit = sem.acquire().await.ok();
                    let mutation = mutator.mutate(&parent.text, diversity).await;
                    let scored = evaluator.evaluate(&mutation.text, &data).await;
                    (parent, mutation, scored)
                }));
            }

            // Gather children, then fold front updates sequentially
            for joined in join_all(tasks).await {
                let Ok((parent, mutation, scored)) = joined else {
                    warn!("Child pipeline panicked, candidate lost");
                    continue;
                };
                let mut child = Candidate::offspring(&parent, mutation.text, mutation.description, gen);
                match scored {
                    Ok(m) => {
                        evaluations += 1;
                        child = child.with_metrics(m);
                        if let Err(e) = front.update(&child) {
                            warn!("Front update rejected candidate {}: {e}", child.id);
                        }
                    }
                    Err(e) => {
                        debug!("Evaluation failed for child of {}: {e}", parent.id);
                    }
                }
                history.push(child);
            }
            generation = gen;

            // Best-effort reflection; adjustments only steer later mutations
            let adjustments = analyzer.analyze(&history, gen, &mut strategy);
            for adj in &adjustments {
                debug!("Strategy adjustment: {} -> {:.2} ({})", adj.parameter, adj.value, adj.reason);
            }

            if detector.check(&history, gen) {
                info!(
                    "✅ Converged at generation {gen} (improvement rate {:.4})",
                    detector.last_rate()
                );
                phase = RunPhase::Converged;
                break;
            }

            debug!(
                "🔄 Generation {gen} complete: front={}, history={}, best={:.3}",
                front.len(),
                history.len(),
                front.best().and_then(|c| c.aggregate()).unwrap_or(0.0)
            );
        }

        if phase == RunPhase::Evolving {
            info!("🏁 Generation cap reached at {generation}");
            phase = RunPhase::MaxGenerationsReached;
        }

        let best = front
            .best()
            .cloned()
            .or_else(|| history.best_evaluated().cloned())
            .ok_or(OptimizerError::NoViableCandidate)?;

        let exhaustive_budget = max_generations as f64 * self.config.population_size as f64 + 1.0;
        let metrics = OptimizationMetrics {
            reflection_depth: analyzer.depth(),
            optimization_score: best.aggregate().unwrap_or(0.0),
            efficiency_multiplier: exhaustive_budget / evaluations.max(1) as f64,
            evolution_generation: generation,
            pareto_front_size: front.len(),
            convergence_rate: detector.last_rate(),
        };

        info!(
            "Run finished: {:?} -> {:?}, best aggregate {:.3}, {} candidates, front size {}",
            phase,
            RunPhase::Completed,
            metrics.optimization_score,
            history.len(),
            metrics.pareto_front_size
        );

        Ok(OptimizationOutcome {
            best_candidate: best,
            metrics,
            evolution_history: history.into_entries(),
            stop: phase,
        })
    }

    /// Up to `parent_sample` parents drawn uniformly with replacement from
    /// the front's top-ranked subset. With an empty front (nothing has been
    /// evaluated yet) the most recent history entries stand in, so mutation
    /// keeps running even when every evaluation fails.
    fn sample_parents(
        &self,
        front: &ParetoFront,
        history: &History,
        rng: &mut StdRng,
    ) -> Vec<Candidate> {
        let pool = front.top_ranked(self.config.parent_sample);
        if !pool.is_empty() {
            return (0..self.config.parent_sample)
                .map(|_| pool[rng.gen_range(0..pool.len())].clone())
                .collect();
        }
        history
            .entries()
            .iter()
            .rev()
            .take(self.config.parent_sample)
            .cloned()
            .collect()
    }
}
