//! Optimal strategy: exchange search with a Balanced fallback.

use std::sync::Arc;

use super::{
    Balanced, CandidatePool, DesignRng, DesignStrategy, ExchangeOptimizer, FedorovExchange,
    GenerationContext, StrategyOutput,
};
use crate::design::{evaluate_efficiency, RawDesign};
use crate::error::{Error, Result};

/// Largest candidate pool the exchange search will enumerate.
pub const MAX_CANDIDATE_POOL: usize = 5000;

/// Per-version exchange search over all possible tasks.
///
/// If the optimizer is unavailable, the pool is too large, or the optimizer
/// returns the wrong number of tasks, the solver logs a warning and runs
/// [`Balanced`] instead, recording the reason in
/// [`StrategyOutput::degradations`].
#[derive(Debug, Clone)]
pub struct OptimalSolver {
    optimizer: Option<Arc<dyn ExchangeOptimizer>>,
    max_pool: usize,
}

impl Default for OptimalSolver {
    fn default() -> Self {
        Self::new(FedorovExchange::default())
    }
}

impl OptimalSolver {
    /// Solver backed by `optimizer`.
    #[must_use]
    pub fn new(optimizer: impl ExchangeOptimizer + 'static) -> Self {
        Self {
            optimizer: Some(Arc::new(optimizer)),
            max_pool: MAX_CANDIDATE_POOL,
        }
    }

    /// Solver with no optimizer; always falls back to Balanced.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            optimizer: None,
            max_pool: MAX_CANDIDATE_POOL,
        }
    }

    /// Override the candidate pool limit.
    #[must_use]
    pub fn with_max_pool(mut self, max_pool: usize) -> Self {
        self.max_pool = max_pool;
        self
    }

    /// Whether an optimizer is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.optimizer.is_some()
    }

    fn solve(&self, ctx: &GenerationContext<'_>, rng: &mut DesignRng) -> Result<StrategyOutput> {
        let optimizer = self
            .optimizer
            .as_ref()
            .ok_or_else(|| Error::optimizer_unavailable("no exchange optimizer configured"))?;

        let pool = CandidatePool::enumerate(ctx.n_items, ctx.k(), self.max_pool)?;
        let tasks = ctx.settings.tasks_per_respondent;
        let distinct = !ctx.settings.allow_repeat_per_respondent;

        let mut versions = Vec::with_capacity(ctx.settings.num_versions);
        let mut passes = 0;
        for v in 1..=ctx.settings.num_versions {
            let outcome = optimizer.select(&pool, tasks, distinct, rng)?;
            if outcome.selected.len() != tasks {
                return Err(Error::optimizer_failed(format!(
                    "{} selected {} of {tasks} tasks for version {v}",
                    optimizer.name(),
                    outcome.selected.len()
                )));
            }
            tracing::debug!(
                version = v,
                passes = outcome.passes,
                log_det = outcome.log_det,
                "exchange search finished"
            );
            passes += outcome.passes;
            versions.push(
                outcome
                    .selected
                    .iter()
                    .map(|&c| pool.task(c).to_vec())
                    .collect::<Vec<_>>(),
            );
        }

        let design = RawDesign::from_versions(&versions, ctx.k())?;
        let d_efficiency = evaluate_efficiency(&design, ctx.n_items).d_efficiency;
        Ok(StrategyOutput {
            design,
            d_efficiency,
            iterations: passes,
            strategy: self.name(),
            degradations: Vec::new(),
        })
    }
}

impl DesignStrategy for OptimalSolver {
    fn name(&self) -> &'static str {
        "Optimal"
    }

    fn generate(&self, ctx: &GenerationContext<'_>, rng: &mut DesignRng) -> Result<StrategyOutput> {
        match self.solve(ctx, rng) {
            Ok(output) => Ok(output),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "optimal design unavailable, falling back to Balanced");
                let mut output = Balanced.generate(ctx, rng)?;
                output
                    .degradations
                    .push(format!("Optimal design unavailable ({e}); used Balanced instead"));
                Ok(output)
            }
            Err(e) => Err(e),
        }
    }
}
