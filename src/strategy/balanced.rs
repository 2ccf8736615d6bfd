//! Balanced strategy: repeated greedy weighted sampling.
//!
//! Each candidate is drawn version by version. Within a version every item
//! carries weight `1 / (count + 1)`, where `count` is how often it has been
//! drawn so far in that version, so rarely shown items are favoured. The
//! search keeps the best-scoring candidate and stops once it reaches the
//! efficiency threshold or the iteration budget runs out.

use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};

use super::{DesignRng, DesignStrategy, GenerationContext, StrategyOutput};
use crate::design::{evaluate_efficiency, RawDesign};
use crate::error::{Error, Result};

/// Draws of one task allowed to retry when it repeats an earlier task.
const MAX_REDRAWS: usize = 20;

/// Generates one candidate design.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSampler<'a> {
    ctx: &'a GenerationContext<'a>,
}

/// Per-version running counts. Fresh for every version of every candidate.
struct VersionCounts {
    n: usize,
    item: Vec<usize>,
    /// `n * n` co-occurrence counts, only maintained for pair balancing.
    pair: Option<Vec<usize>>,
    tasks_seen: HashSet<Vec<usize>>,
}

impl VersionCounts {
    fn new(n: usize, track_pairs: bool) -> Self {
        Self {
            n,
            item: vec![0; n],
            pair: track_pairs.then(|| vec![0; n * n]),
            tasks_seen: HashSet::new(),
        }
    }

    fn record(&mut self, task: &[usize]) {
        for &i in task {
            self.item[i] += 1;
        }
        if let Some(pair) = self.pair.as_mut() {
            for &a in task {
                for &b in task {
                    if a != b {
                        pair[a * self.n + b] += 1;
                    }
                }
            }
        }
        let mut key = task.to_vec();
        key.sort_unstable();
        self.tasks_seen.insert(key);
    }

    fn pair_count(&self, a: usize, b: usize) -> usize {
        self.pair.as_ref().map_or(0, |p| p[a * self.n + b])
    }

    fn is_repeat(&self, task: &[usize]) -> bool {
        let mut key = task.to_vec();
        key.sort_unstable();
        self.tasks_seen.contains(&key)
    }
}

impl<'a> CandidateSampler<'a> {
    /// Sampler for the given context.
    #[must_use]
    pub fn new(ctx: &'a GenerationContext<'a>) -> Self {
        Self { ctx }
    }

    /// Draw one full candidate design.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GenerationFailed`] if the weights cannot be sampled
    /// (e.g. fewer items than slots).
    pub fn sample(&self, rng: &mut DesignRng) -> Result<RawDesign> {
        let settings = self.ctx.settings;
        let versions = (0..settings.num_versions)
            .map(|_| self.sample_version(rng))
            .collect::<Result<Vec<_>>>()?;
        RawDesign::from_versions(&versions, self.ctx.k())
    }

    fn sample_version(&self, rng: &mut DesignRng) -> Result<Vec<Vec<usize>>> {
        let settings = self.ctx.settings;
        let mut counts = VersionCounts::new(self.ctx.n_items, settings.force_min_pair_balance);
        let mut tasks = Vec::with_capacity(settings.tasks_per_respondent);

        for _ in 0..settings.tasks_per_respondent {
            let mut task = self.draw_task(&counts, rng)?;
            if !settings.allow_repeat_per_respondent {
                let mut redraws = 0;
                while counts.is_repeat(&task) && redraws < MAX_REDRAWS {
                    task = self.draw_task(&counts, rng)?;
                    redraws += 1;
                }
            }
            counts.record(&task);
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Draw K distinct items, one at a time, with count-based weights.
    fn draw_task(&self, counts: &VersionCounts, rng: &mut DesignRng) -> Result<Vec<usize>> {
        let n = self.ctx.n_items;
        let k = self.ctx.k();
        let settings = self.ctx.settings;

        let under_cap = counts
            .item
            .iter()
            .filter(|&&c| c < settings.max_item_repeats)
            .count();
        // The repeat cap is lifted when it would leave fewer than K items.
        let mut eligible: Vec<bool> = if under_cap >= k {
            counts
                .item
                .iter()
                .map(|&c| c < settings.max_item_repeats)
                .collect()
        } else {
            vec![true; n]
        };

        let mut task = Vec::with_capacity(k);
        for _ in 0..k {
            let weights: Vec<f64> = (0..n)
                .map(|i| {
                    if !eligible[i] {
                        return 0.0;
                    }
                    let mut w = 1.0 / (counts.item[i] + 1) as f64;
                    if settings.force_min_pair_balance {
                        let shared: usize = task.iter().map(|&c| counts.pair_count(i, c)).sum();
                        w /= (1 + shared) as f64;
                    }
                    w
                })
                .collect();

            let dist = WeightedIndex::new(&weights).map_err(|e| {
                Error::generation_failed(format!("cannot draw {k} items from {n}: {e}"))
            })?;
            let pick = dist.sample(rng);
            eligible[pick] = false;
            task.push(pick);
        }
        Ok(task)
    }
}

/// The Balanced strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Balanced;

impl DesignStrategy for Balanced {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn generate(&self, ctx: &GenerationContext<'_>, rng: &mut DesignRng) -> Result<StrategyOutput> {
        let sampler = CandidateSampler::new(ctx);
        let budget = ctx.settings.balanced_iterations();
        let threshold = ctx.settings.efficiency_threshold;

        let mut best: Option<(RawDesign, f64)> = None;
        let mut iterations = 0;
        let mut last_error = None;

        for i in 0..budget {
            iterations = i + 1;
            let candidate = match sampler.sample(rng) {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::debug!(iteration = iterations, error = %e, "candidate draw failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let score = evaluate_efficiency(&candidate, ctx.n_items).d_efficiency;
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                tracing::debug!(iteration = iterations, d_efficiency = score, "new best candidate");
                best = Some((candidate, score));
            }
            if best.as_ref().is_some_and(|(_, s)| *s >= threshold) {
                break;
            }
        }

        let (design, d_efficiency) = best.ok_or_else(|| {
            Error::generation_failed(format!(
                "no candidate design produced in {budget} iterations{}",
                last_error.map(|e| format!(" (last error: {e})")).unwrap_or_default()
            ))
        })?;

        Ok(StrategyOutput {
            design,
            d_efficiency,
            iterations,
            strategy: self.name(),
            degradations: Vec::new(),
        })
    }
}
