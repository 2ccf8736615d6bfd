//! Design generation strategies.
//!
//! | Strategy | Method | Notes |
//! |----------|--------|-------|
//! | [`Balanced`] | best-of-N greedy weighted sampling | stops early at the efficiency threshold |
//! | [`RandomSampler`] | uniform sampling without replacement | baseline, single pass |
//! | [`OptimalSolver`] | exchange search over all `C(n, K)` tasks | falls back to [`Balanced`] |
//!
//! All strategies implement [`DesignStrategy`] and draw every random number
//! from the [`DesignRng`] they are handed, so a seed fixes the result.
//!
//! ```
//! use maxdiff::strategy::{Balanced, DesignStrategy, GenerationContext, DesignRng};
//! use maxdiff::DesignSettings;
//! use rand::SeedableRng;
//!
//! let settings = DesignSettings { items_per_task: 3, tasks_per_respondent: 6, ..Default::default() };
//! let ctx = GenerationContext::new(&settings, 6);
//! let mut rng = DesignRng::seed_from_u64(7);
//!
//! let out = Balanced.generate(&ctx, &mut rng).unwrap();
//! assert_eq!(out.design.n_rows(), 6);
//! assert!(out.d_efficiency > 0.0);
//! ```

mod balanced;
mod exchange;
mod optimal;
mod random;

pub use balanced::{Balanced, CandidateSampler};
pub use exchange::{CandidatePool, ExchangeOptimizer, ExchangeOutcome, FedorovExchange};
pub use optimal::{OptimalSolver, MAX_CANDIDATE_POOL};
pub use random::RandomSampler;

use crate::design::RawDesign;
use crate::error::Result;
use crate::settings::DesignSettings;

/// The one random number generator threaded through generation and
/// post-processing.
pub type DesignRng = rand::rngs::StdRng;

/// Inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Generation settings, already range-checked.
    pub settings: &'a DesignSettings,
    /// Number of included items; designs use indices `0..n_items`.
    pub n_items: usize,
}

impl<'a> GenerationContext<'a> {
    /// Bundle settings with the included item count.
    #[must_use]
    pub fn new(settings: &'a DesignSettings, n_items: usize) -> Self {
        Self { settings, n_items }
    }

    /// Items per task.
    #[must_use]
    pub fn k(&self) -> usize {
        self.settings.items_per_task
    }
}

/// What a strategy hands back to the generator.
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    /// The chosen design, before post-processing.
    pub design: RawDesign,
    /// Its efficiency estimate.
    pub d_efficiency: f64,
    /// Candidates drawn or exchange passes run.
    pub iterations: usize,
    /// Name of the strategy that actually produced the design.
    pub strategy: &'static str,
    /// Why the result is not what was asked for, e.g. an optimizer fallback.
    pub degradations: Vec<String>,
}

/// A way of producing a raw design.
pub trait DesignStrategy: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Produce a design for all versions and tasks.
    ///
    /// # Errors
    ///
    /// Returns an error only if no design at all could be produced.
    fn generate(&self, ctx: &GenerationContext<'_>, rng: &mut DesignRng) -> Result<StrategyOutput>;
}
