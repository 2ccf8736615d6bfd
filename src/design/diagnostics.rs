//! Frequency tables and efficiency for a design table.

use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::stats::{evaluate_efficiency, EfficiencyReport};
use super::DesignTable;

/// Co-occurrence count of one unordered item pair (`first < second`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairFrequency {
    /// Lexicographically smaller id.
    pub first: String,
    /// Lexicographically larger id.
    pub second: String,
    /// Tasks showing both items.
    pub count: usize,
}

/// Frequency tables and efficiency of a design.
///
/// Computed by [`DesignDiagnostics::compute`] from a table and the included
/// item ids alone, so a generated design and the same design read back from
/// a file produce identical diagnostics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignDiagnostics {
    /// Appearances of each item across all slots of all rows. Every
    /// included item is present, with zero if never shown.
    pub item_frequency: BTreeMap<String, usize>,
    /// Observed pair co-occurrences, sorted by pair.
    pub pair_frequency: Vec<PairFrequency>,
    /// Per display slot, appearances of each item in that slot.
    pub position_balance: Vec<BTreeMap<String, usize>>,
    /// Balance-based efficiency estimate in `[0, 1]`.
    pub d_efficiency: f64,
    /// Coefficient of variation of `item_frequency`.
    pub item_frequency_cv: f64,
    /// Coefficient of variation of pair counts over all possible pairs.
    pub pair_frequency_cv: f64,
    /// Expected appearances per item under perfect balance.
    pub expected_item_frequency: f64,
    /// Expected co-occurrences per pair under perfect balance.
    pub expected_pair_frequency: f64,
    /// Rows in the table.
    pub n_rows: usize,
    /// Distinct versions in the table.
    pub n_versions: usize,
    /// Items per task.
    pub items_per_task: usize,
}

/// Scalar digest of [`DesignDiagnostics`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagnosticsSummary {
    /// Items in the frequency support.
    pub n_items: usize,
    /// Rows in the table.
    pub n_rows: usize,
    /// Distinct versions.
    pub n_versions: usize,
    /// Items per task.
    pub items_per_task: usize,
    /// Efficiency estimate.
    pub d_efficiency: f64,
    /// Item-frequency coefficient of variation.
    pub item_frequency_cv: f64,
    /// Pair-frequency coefficient of variation.
    pub pair_frequency_cv: f64,
    /// Expected appearances per item.
    pub expected_item_frequency: f64,
    /// Fewest appearances of any item.
    pub min_item_frequency: usize,
    /// Most appearances of any item.
    pub max_item_frequency: usize,
}

impl DesignDiagnostics {
    /// Compute diagnostics for `table`.
    ///
    /// The frequency support is `included_ids` plus any id the table uses
    /// that is not in it, so externally supplied designs never lose counts.
    #[must_use]
    pub fn compute(table: &DesignTable, included_ids: &[String]) -> Self {
        let support = frequency_support(table, included_ids);
        let raw = table
            .to_raw(&support)
            .expect("frequency support covers every id in the table");
        let report = evaluate_efficiency(&raw, support.len());
        Self::from_report(table, &support, &report)
    }

    fn from_report(table: &DesignTable, support: &[String], report: &EfficiencyReport) -> Self {
        let item_frequency = support
            .iter()
            .cloned()
            .zip(report.item_frequency.iter().copied())
            .collect();

        let mut pair_frequency: Vec<PairFrequency> = report
            .pair_frequency
            .iter()
            .map(|(&(a, b), &count)| {
                let (first, second) = if support[a] <= support[b] {
                    (support[a].clone(), support[b].clone())
                } else {
                    (support[b].clone(), support[a].clone())
                };
                PairFrequency {
                    first,
                    second,
                    count,
                }
            })
            .collect();
        pair_frequency.sort();

        let k = table.items_per_task();
        let mut position_balance: Vec<BTreeMap<String, usize>> = (0..k)
            .map(|_| support.iter().map(|id| (id.clone(), 0)).collect())
            .collect();
        for row in table.rows() {
            for (slot, id) in row.items.iter().enumerate() {
                if let Some(count) = position_balance[slot].get_mut(id) {
                    *count += 1;
                }
            }
        }

        Self {
            item_frequency,
            pair_frequency,
            position_balance,
            d_efficiency: report.d_efficiency,
            item_frequency_cv: report.item_frequency_cv,
            pair_frequency_cv: report.pair_frequency_cv,
            expected_item_frequency: report.expected_item_frequency,
            expected_pair_frequency: report.expected_pair_frequency,
            n_rows: table.len(),
            n_versions: table.versions().len(),
            items_per_task: k,
        }
    }

    /// Co-occurrences of two items, in either order.
    #[must_use]
    pub fn pair_count(&self, a: &str, b: &str) -> usize {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        self.pair_frequency
            .iter()
            .find(|p| p.first == first && p.second == second)
            .map_or(0, |p| p.count)
    }

    /// Sum of all item appearances; equals rows × K.
    #[must_use]
    pub fn total_item_appearances(&self) -> usize {
        self.item_frequency.values().sum()
    }

    /// Scalar digest for reports and validation results.
    #[must_use]
    pub fn summary(&self) -> DiagnosticsSummary {
        DiagnosticsSummary {
            n_items: self.item_frequency.len(),
            n_rows: self.n_rows,
            n_versions: self.n_versions,
            items_per_task: self.items_per_task,
            d_efficiency: self.d_efficiency,
            item_frequency_cv: self.item_frequency_cv,
            pair_frequency_cv: self.pair_frequency_cv,
            expected_item_frequency: self.expected_item_frequency,
            min_item_frequency: self.item_frequency.values().copied().min().unwrap_or(0),
            max_item_frequency: self.item_frequency.values().copied().max().unwrap_or(0),
        }
    }
}

fn frequency_support(table: &DesignTable, included_ids: &[String]) -> Vec<String> {
    let known: BTreeSet<&str> = included_ids.iter().map(String::as_str).collect();
    let extra: BTreeSet<&str> = table
        .rows()
        .iter()
        .flat_map(|r| r.items.iter().map(String::as_str))
        .filter(|id| !known.contains(id))
        .collect();

    included_ids
        .iter()
        .cloned()
        .chain(extra.into_iter().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::RawDesign;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn table() -> DesignTable {
        let support = ids(&["A", "B", "C", "D"]);
        RawDesign::from_versions(
            &[
                vec![vec![0, 1, 2], vec![3, 0, 1]],
                vec![vec![2, 3, 0], vec![1, 2, 3]],
            ],
            3,
        )
        .unwrap()
        .to_table(&support)
    }

    #[test]
    fn test_item_and_pair_tables() {
        let diag = DesignDiagnostics::compute(&table(), &ids(&["A", "B", "C", "D"]));

        assert_eq!(diag.item_frequency["A"], 3);
        assert_eq!(diag.item_frequency["D"], 3);
        assert_eq!(diag.total_item_appearances(), 4 * 3);
        assert_eq!(diag.pair_count("A", "B"), 2);
        assert_eq!(diag.pair_count("B", "A"), 2);
        assert_eq!(diag.pair_count("C", "D"), 2);
        assert_eq!(diag.n_versions, 2);
        assert_eq!(diag.n_rows, 4);
        assert!(diag.pair_frequency.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_position_balance() {
        let diag = DesignDiagnostics::compute(&table(), &ids(&["A", "B", "C", "D"]));

        assert_eq!(diag.position_balance.len(), 3);
        assert_eq!(diag.position_balance[0]["A"], 1);
        assert_eq!(diag.position_balance[0]["D"], 1);
        assert_eq!(diag.position_balance[2]["B"], 1);
        for slot in &diag.position_balance {
            assert_eq!(slot.values().sum::<usize>(), 4);
        }
    }

    #[test]
    fn test_unshown_included_item_present_with_zero() {
        let diag = DesignDiagnostics::compute(&table(), &ids(&["A", "B", "C", "D", "E"]));
        assert_eq!(diag.item_frequency["E"], 0);
        assert_eq!(diag.summary().min_item_frequency, 0);
        assert_eq!(diag.summary().n_items, 5);
    }

    #[test]
    fn test_foreign_ids_counted() {
        let diag = DesignDiagnostics::compute(&table(), &ids(&["A", "B"]));
        assert_eq!(diag.item_frequency["C"], 3);
        assert_eq!(diag.total_item_appearances(), 12);
    }

    #[test]
    fn test_recompute_is_identical() {
        let t = table();
        let support = ids(&["A", "B", "C", "D"]);
        assert_eq!(
            DesignDiagnostics::compute(&t, &support),
            DesignDiagnostics::compute(&t.clone(), &support)
        );
    }
}
