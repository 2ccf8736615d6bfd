//! Frequency counts and the efficiency estimate.
//!
//! The efficiency here is a cheap balance proxy used to rank candidates, not
//! a D-optimality computation from a model's information matrix:
//!
//! ```text
//! itemBalance = 1 - sd(itemFreq) / E[itemFreq]
//! pairBalance = 1 - min(1, sd(pairFreq) / max(1, E[pairFreq]))
//! dEfficiency = sqrt(itemBalance * pairBalance), clamped to [0, 1]
//! ```
//!
//! Both frequency distributions are taken over their full support: every
//! item, and every unordered item pair, counts even when it never appears.

use std::collections::BTreeMap;

use super::RawDesign;
use crate::utils::{binomial, coefficient_of_variation, std_dev};

/// Frequency statistics and the efficiency estimate of a design.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyReport {
    /// Appearances of each item, indexed like the support list.
    pub item_frequency: Vec<usize>,
    /// Co-occurrences of each observed pair `(lo, hi)` of item indices.
    pub pair_frequency: BTreeMap<(usize, usize), usize>,
    /// `rows * K / nItems`.
    pub expected_item_frequency: f64,
    /// `rows * C(K, 2) / C(nItems, 2)`.
    pub expected_pair_frequency: f64,
    /// `1 - sd / expected` for items, floored at 0.
    pub item_balance: f64,
    /// Pair balance, floored at 0.
    pub pair_balance: f64,
    /// Geometric mean of the two balances.
    pub d_efficiency: f64,
    /// Coefficient of variation of item frequencies.
    pub item_frequency_cv: f64,
    /// Coefficient of variation of pair frequencies.
    pub pair_frequency_cv: f64,
}

/// Count how often each unordered pair of items shares a task.
///
/// Each task contributes one count per pair regardless of slot order.
/// A repeated index within a task (only possible in malformed external
/// designs) does not pair with itself.
#[must_use]
pub fn pair_frequencies(design: &RawDesign) -> BTreeMap<(usize, usize), usize> {
    let mut counts = BTreeMap::new();
    let mut sorted = Vec::with_capacity(design.items_per_task());

    for row in design.rows() {
        sorted.clear();
        sorted.extend(row.iter().copied());
        sorted.sort_unstable();

        for a in 0..sorted.len() {
            for b in (a + 1)..sorted.len() {
                if sorted[a] != sorted[b] {
                    *counts.entry((sorted[a], sorted[b])).or_insert(0) += 1;
                }
            }
        }
    }
    counts
}

/// Score a design over a support of `n_items` items.
///
/// Every index in `design` must be below `n_items`.
///
/// # Panics
///
/// Panics if the design references an index `>= n_items`.
#[must_use]
pub fn evaluate_efficiency(design: &RawDesign, n_items: usize) -> EfficiencyReport {
    let rows = design.n_rows();
    let k = design.items_per_task();

    let mut item_frequency = vec![0usize; n_items];
    for &idx in design.data() {
        item_frequency[idx] += 1;
    }
    let item_values: Vec<f64> = item_frequency.iter().map(|&c| c as f64).collect();

    let expected_item_frequency = if n_items == 0 {
        0.0
    } else {
        (rows * k) as f64 / n_items as f64
    };
    let item_balance = if expected_item_frequency > 0.0 {
        (1.0 - std_dev(&item_values) / expected_item_frequency).max(0.0)
    } else {
        0.0
    };

    let pair_frequency = pair_frequencies(design);
    let n_pairs = binomial(n_items as u64, 2).unwrap_or(0) as f64;
    let pairs_per_task = binomial(k as u64, 2).unwrap_or(0) as f64;
    let expected_pair_frequency = if n_pairs > 0.0 {
        rows as f64 * pairs_per_task / n_pairs
    } else {
        0.0
    };

    let (pair_mean, pair_sd) = support_moments(&pair_frequency, n_pairs);
    let pair_balance = if pair_frequency.is_empty() {
        1.0
    } else {
        1.0 - (pair_sd / expected_pair_frequency.max(1.0)).min(1.0)
    };
    let pair_frequency_cv = if pair_mean > 0.0 { pair_sd / pair_mean } else { 0.0 };

    let d_efficiency = (item_balance * pair_balance).sqrt().clamp(0.0, 1.0);

    EfficiencyReport {
        item_frequency_cv: coefficient_of_variation(&item_values),
        item_frequency,
        pair_frequency,
        expected_item_frequency,
        expected_pair_frequency,
        item_balance,
        pair_balance,
        d_efficiency,
        pair_frequency_cv,
    }
}

/// Mean and population standard deviation of pair counts over `support`
/// pairs, where pairs missing from `counts` count as zero.
fn support_moments(counts: &BTreeMap<(usize, usize), usize>, support: f64) -> (f64, f64) {
    if support <= 0.0 {
        return (0.0, 0.0);
    }
    let (sum, sum_sq) = counts.values().fold((0.0, 0.0), |(s, sq), &c| {
        let c = c as f64;
        (s + c, sq + c * c)
    });
    let mean = sum / support;
    let var = (sum_sq / support - mean * mean).max(0.0);
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(tasks: Vec<Vec<usize>>, k: usize) -> RawDesign {
        RawDesign::from_versions(&[tasks], k).unwrap()
    }

    #[test]
    fn test_pair_counts_ignore_slot_order() {
        let d = design(vec![vec![0, 1, 2], vec![2, 1, 0], vec![3, 0, 1]], 3);
        let pairs = pair_frequencies(&d);

        assert_eq!(pairs[&(0, 1)], 3);
        assert_eq!(pairs[&(0, 2)], 2);
        assert_eq!(pairs[&(1, 2)], 2);
        assert_eq!(pairs[&(0, 3)], 1);
        assert_eq!(pairs[&(1, 3)], 1);
        assert!(!pairs.contains_key(&(2, 3)));
        assert_eq!(pairs.values().sum::<usize>(), 3 * 3);
    }

    #[test]
    fn test_unshown_items_count_as_zero() {
        // Item 3 never appears.
        let d = design(vec![vec![0, 1], vec![1, 2], vec![0, 2]], 2);
        let report = evaluate_efficiency(&d, 4);

        assert_eq!(report.item_frequency, vec![2, 2, 2, 0]);
        assert!((report.expected_item_frequency - 1.5).abs() < 1e-12);
        assert!(report.item_frequency_cv > 0.0);
        assert!(report.item_balance < 1.0);
    }

    #[test]
    fn test_perfect_design() {
        // Every pair of 4 items exactly once, every item 3 times.
        let d = design(
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]],
            2,
        );
        let report = evaluate_efficiency(&d, 4);

        assert!((report.item_balance - 1.0).abs() < 1e-12);
        assert!((report.pair_balance - 1.0).abs() < 1e-12);
        assert!((report.d_efficiency - 1.0).abs() < 1e-12);
        assert!(report.item_frequency_cv.abs() < 1e-12);
        assert!(report.pair_frequency_cv.abs() < 1e-12);
        assert!((report.expected_pair_frequency - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pair_statistics_count_unseen_pairs() {
        // Items perfectly balanced, but only 2 of the 6 pairs ever appear.
        let d = design(vec![vec![0, 1], vec![2, 3], vec![0, 1], vec![2, 3]], 2);
        let report = evaluate_efficiency(&d, 4);

        assert!(report.item_frequency_cv.abs() < 1e-12);
        assert_eq!(report.pair_frequency.len(), 2);
        // Counts [2, 2, 0, 0, 0, 0]: mean 2/3, sd 2*sqrt(2)/3.
        assert!((report.pair_frequency_cv - 2f64.sqrt()).abs() < 1e-12);
        assert!(report.pair_balance < 0.1);
        assert!(report.d_efficiency < 0.5);
    }

    #[test]
    fn test_repeated_task_scores_lower() {
        let balanced = design(vec![vec![0, 1], vec![2, 3], vec![0, 2], vec![1, 3]], 2);
        let lopsided = design(vec![vec![0, 1], vec![0, 1], vec![0, 1], vec![2, 3]], 2);

        let good = evaluate_efficiency(&balanced, 4).d_efficiency;
        let bad = evaluate_efficiency(&lopsided, 4).d_efficiency;
        assert!(good > bad, "{good} should beat {bad}");
        assert!((0.0..=1.0).contains(&bad));
    }

    #[test]
    fn test_extreme_imbalance_clamps_at_zero() {
        let d = design(vec![vec![0, 1]; 10], 2);
        let report = evaluate_efficiency(&d, 10);
        assert!(report.item_balance >= 0.0);
        assert!(report.d_efficiency >= 0.0 && report.d_efficiency <= 1.0);
        assert!(!report.d_efficiency.is_nan());
    }

    #[test]
    fn test_self_pairs_skipped() {
        let d = design(vec![vec![0, 0, 1]], 3);
        let pairs = pair_frequencies(&d);
        assert_eq!(pairs.get(&(0, 0)), None);
        assert_eq!(pairs[&(0, 1)], 2);
    }
}
