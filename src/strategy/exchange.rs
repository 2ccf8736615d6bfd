//! Candidate-set exchange search for D-optimal task selection.
//!
//! A task showing item set `S` contributes `diag(z) - z zᵀ / K` to the
//! information matrix, where `z` is the indicator vector of `S`. One item is
//! dropped as reference so the sum is non-singular for connected designs.
//! The exchange search maximizes `ln det` of that sum.
//!
//! Candidates are scored with the determinant lemma: adding task `S` to a
//! factored matrix `A` multiplies the determinant by `det(I + B W)`, where
//! `B` is the task's own block and `W` the matching block of `A⁻¹`. One
//! inversion per slot turns every candidate into a `K × K` problem.

use ndarray::Array2;
use rand::seq::index;
use rand::Rng;

use super::DesignRng;
use crate::error::{Error, Result};
use crate::utils::{binomial, combinations, log_det_lu, log_det_psd, ridge_inverse};

/// Smallest `ln det` gain accepted as an improvement.
const IMPROVEMENT_TOLERANCE: f64 = 1e-9;

/// Every possible task of `K` items from `n`, in lexicographic order.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    n_items: usize,
    items_per_task: usize,
    tasks: Vec<Vec<usize>>,
}

impl CandidatePool {
    /// Enumerate all `C(n_items, items_per_task)` tasks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptimizerFailed`] if the pool would exceed
    /// `max_size` tasks.
    pub fn enumerate(n_items: usize, items_per_task: usize, max_size: usize) -> Result<Self> {
        let size = binomial(n_items as u64, items_per_task as u64);
        match size {
            Some(s) if s <= max_size as u64 => {}
            _ => {
                return Err(Error::optimizer_failed(format!(
                    "candidate pool C({n_items}, {items_per_task}) = {} exceeds the limit of {max_size} tasks",
                    size.map_or_else(|| "overflow".to_string(), |s| s.to_string())
                )))
            }
        }

        Ok(Self {
            n_items,
            items_per_task,
            tasks: combinations(n_items, items_per_task).collect(),
        })
    }

    /// Number of candidate tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Items of candidate `idx`, ascending.
    #[must_use]
    pub fn task(&self, idx: usize) -> &[usize] {
        &self.tasks[idx]
    }

    /// Items per task.
    #[must_use]
    pub fn items_per_task(&self) -> usize {
        self.items_per_task
    }

    /// Information matrix of a selection (with repeats), reference item dropped.
    #[must_use]
    pub fn information(&self, selected: &[usize]) -> Array2<f64> {
        let d = self.n_items.saturating_sub(1);
        let mut info = Array2::zeros((d, d));
        for &t in selected {
            self.accumulate(&mut info, t, 1.0);
        }
        info
    }

    /// Add (`sign = 1`) or remove (`sign = -1`) one task's contribution.
    pub(crate) fn accumulate(&self, info: &mut Array2<f64>, idx: usize, sign: f64) {
        let d = info.nrows();
        let k = self.items_per_task as f64;
        let task = &self.tasks[idx];
        for &a in task.iter().filter(|&&a| a < d) {
            info[[a, a]] += sign * (1.0 - 1.0 / k);
            for &b in task.iter().filter(|&&b| b < d && b != a) {
                info[[a, b]] -= sign / k;
            }
        }
    }

    /// `ln det` of `info` with candidate `idx` added, by full factorization.
    pub(crate) fn score_with(&self, info: &Array2<f64>, idx: usize) -> f64 {
        let mut trial = info.clone();
        self.accumulate(&mut trial, idx, 1.0);
        log_det_psd(&trial)
    }
}

/// Scores candidate additions against one information matrix.
pub(crate) struct SwapScorer<'a> {
    pool: &'a CandidatePool,
    info: &'a Array2<f64>,
    /// `(A + ridge)⁻¹` and `ln det(A + ridge)`; `None` falls back to full scoring.
    factor: Option<(Array2<f64>, f64)>,
}

impl<'a> SwapScorer<'a> {
    pub(crate) fn new(pool: &'a CandidatePool, info: &'a Array2<f64>) -> Self {
        Self {
            pool,
            info,
            factor: ridge_inverse(info),
        }
    }

    /// `ln det` of the matrix with candidate `idx` added.
    pub(crate) fn score(&self, idx: usize) -> f64 {
        let Some((inverse, base)) = &self.factor else {
            return self.pool.score_with(self.info, idx);
        };

        let d = inverse.nrows();
        let rows: Vec<usize> = self.pool.tasks[idx]
            .iter()
            .copied()
            .filter(|&a| a < d)
            .collect();
        let m = rows.len();
        if m == 0 {
            return *base;
        }

        // I + B W with B = I - J / K, so (B W)[i][j] = W[i][j] - colsum_j(W) / K.
        let k = self.pool.items_per_task as f64;
        let col_sums: Vec<f64> = rows
            .iter()
            .map(|&c| rows.iter().map(|&r| inverse[[r, c]]).sum())
            .collect();
        let update = Array2::from_shape_fn((m, m), |(i, j)| {
            let identity = if i == j { 1.0 } else { 0.0 };
            identity + inverse[[rows[i], rows[j]]] - col_sums[j] / k
        });
        base + log_det_lu(update)
    }
}

/// Result of one exchange run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeOutcome {
    /// Selected candidate indices, one per task.
    pub selected: Vec<usize>,
    /// Full passes over the selection.
    pub passes: usize,
    /// `ln det` of the final information matrix.
    pub log_det: f64,
}

/// Picks a set of tasks from a candidate pool.
///
/// Implement this to plug in an external solver; [`FedorovExchange`] is the
/// built-in one.
pub trait ExchangeOptimizer: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Select `n_tasks` candidates. With `distinct`, no candidate may be
    /// selected twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptimizerFailed`] if no selection can be made.
    fn select(
        &self,
        pool: &CandidatePool,
        n_tasks: usize,
        distinct: bool,
        rng: &mut DesignRng,
    ) -> Result<ExchangeOutcome>;
}

/// Fedorov-style point exchange from a random start.
///
/// Each pass visits every selected task in turn and swaps it for the pool
/// candidate that most increases `ln det`. Stops when a pass makes no swap
/// or after `max_passes`.
#[derive(Debug, Clone, Copy)]
pub struct FedorovExchange {
    /// Pass limit.
    pub max_passes: usize,
}

impl Default for FedorovExchange {
    fn default() -> Self {
        Self { max_passes: 50 }
    }
}

impl FedorovExchange {
    /// Exchange with a pass limit.
    #[must_use]
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }
}

impl ExchangeOptimizer for FedorovExchange {
    fn name(&self) -> &'static str {
        "fedorov"
    }

    fn select(
        &self,
        pool: &CandidatePool,
        n_tasks: usize,
        distinct: bool,
        rng: &mut DesignRng,
    ) -> Result<ExchangeOutcome> {
        if pool.is_empty() {
            return Err(Error::optimizer_failed("candidate pool is empty"));
        }
        let distinct = distinct && pool.len() >= n_tasks;

        let mut selected: Vec<usize> = if distinct {
            index::sample(rng, pool.len(), n_tasks).into_vec()
        } else {
            (0..n_tasks).map(|_| rng.gen_range(0..pool.len())).collect()
        };
        let mut info = pool.information(&selected);
        let mut current = log_det_psd(&info);
        let mut passes = 0;

        while passes < self.max_passes {
            passes += 1;
            let mut improved = false;

            for slot in 0..n_tasks {
                let outgoing = selected[slot];
                pool.accumulate(&mut info, outgoing, -1.0);

                let excluded = |c: usize| distinct && c != outgoing && selected.contains(&c);
                let best = best_swap(&SwapScorer::new(pool, &info), excluded);
                match best {
                    Some((incoming, score)) if score > current + IMPROVEMENT_TOLERANCE => {
                        pool.accumulate(&mut info, incoming, 1.0);
                        selected[slot] = incoming;
                        current = score;
                        improved = true;
                    }
                    _ => pool.accumulate(&mut info, outgoing, 1.0),
                }
            }

            tracing::trace!(pass = passes, log_det = current, "exchange pass");
            if !improved {
                break;
            }
        }

        Ok(ExchangeOutcome {
            selected,
            passes,
            log_det: current,
        })
    }
}

/// Best candidate to add; ties go to the lower index.
#[cfg(not(feature = "parallel"))]
fn best_swap(scorer: &SwapScorer<'_>, excluded: impl Fn(usize) -> bool) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for c in (0..scorer.pool.len()).filter(|&c| !excluded(c)) {
        let score = scorer.score(c);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((c, score));
        }
    }
    best
}

#[cfg(feature = "parallel")]
fn best_swap(
    scorer: &SwapScorer<'_>,
    excluded: impl Fn(usize) -> bool + Sync,
) -> Option<(usize, f64)> {
    crate::parallel::best_candidate(scorer.pool.len(), excluded, |c| scorer.score(c))
}
