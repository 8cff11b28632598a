//! Reflective Analyzer
//!
//! Best-effort feedback hook: inspects weak candidates from the two most
//! recent generations and widens the mutation strategy for the generations
//! that follow. It can only nudge parameters; it never blocks or fails the
//! main loop.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::optimizer::candidate::History;

pub const DEFAULT_ACCURACY_FLOOR: f64 = 0.8;
pub const DEFAULT_EFFICIENCY_FLOOR: f64 = 0.7;

/// Tunable knobs the mutation collaborator consults each generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationStrategy {
    /// In (0, 1]; higher values let the mutator draw from a broader pool
    /// of mutation kinds.
    pub diversity: f64,
}

impl Default for MutationStrategy {
    fn default() -> Self {
        Self { diversity: 0.3 }
    }
}

/// One parameter change proposed by a reflection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAdjustment {
    pub parameter: String,
    pub value: f64,
    pub reason: String,
}

#[derive(Debug)]
pub struct ReflectiveAnalyzer {
    accuracy_floor: f64,
    efficiency_floor: f64,
    passes: u32,
}

impl ReflectiveAnalyzer {
    pub fn new() -> Self {
        Self {
            accuracy_floor: DEFAULT_ACCURACY_FLOOR,
            efficiency_floor: DEFAULT_EFFICIENCY_FLOOR,
            passes: 0,
        }
    }

    pub fn with_floors(mut self, accuracy: f64, efficiency: f64) -> Self {
        self.accuracy_floor = accuracy;
        self.efficiency_floor = efficiency;
        self
    }

    /// Scan the two most recent generations and adjust the strategy in
    /// place. Returns the adjustments applied, empty when everything is
    /// above the quality floors.
    pub fn analyze(
        &mut self,
        history: &History,
        generation: u32,
        strategy: &mut MutationStrategy,
    ) -> Vec<StrategyAdjustment> {
        let from = generation.saturating_sub(1);

        let mut scored = 0usize;
        let mut weak = 0usize;
        for c in history.entries() {
            if c.generation < from || c.generation > generation {
                continue;
            }
            let Some(m) = c.metrics else { continue };
            scored += 1;
            if m.accuracy < self.accuracy_floor || m.efficiency < self.efficiency_floor {
                weak += 1;
            }
        }

        if weak == 0 || scored == 0 {
            return Vec::new();
        }

        self.passes += 1;
        let weak_ratio = weak as f64 / scored as f64;
        let widened = (strategy.diversity + 0.1 * weak_ratio).min(1.0);

        let adjustment = StrategyAdjustment {
            parameter: "mutation_diversity".to_string(),
            value: widened,
            reason: format!(
                "{weak} of {scored} candidates in generations {from}..={generation} under quality floor"
            ),
        };
        debug!(
            "🔍 Reflection pass {}: diversity {:.2} -> {:.2} ({})",
            self.passes, strategy.diversity, widened, adjustment.reason
        );
        strategy.diversity = widened;

        vec![adjustment]
    }

    /// How many reflection passes produced adjustments, capped for the
    /// summary metrics.
    pub fn depth(&self) -> u32 {
        self.passes.min(5)
    }
}

impl Default for ReflectiveAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
