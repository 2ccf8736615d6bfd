//! Builder pattern for generating MaxDiff designs.
//!
//! The builder collects items, settings and a seed, then runs the whole
//! generation pipeline in [`DesignBuilder::build`].
//!
//! # Example
//!
//! ```
//! use maxdiff::{DesignBuilder, DesignType};
//!
//! let design = DesignBuilder::new()
//!     .item_ids(["A", "B", "C", "D", "E", "F", "G", "H"])
//!     .items_per_task(4)
//!     .tasks_per_respondent(10)
//!     .design_type(DesignType::Balanced)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(design.table.len(), 10);
//! assert!(design.validation.valid);
//! ```
//!
//! # Strategy Selection
//!
//! - **Balanced** (default): best of repeated count-weighted draws
//! - **Random**: independent uniform draws, no search
//! - **Optimal**: exchange search over every possible task, falling back to
//!   Balanced when the search cannot run

use crate::error::{Error, Result};
use crate::generator::{DesignGenerator, GeneratedDesign};
use crate::items::{Item, ItemSet};
use crate::settings::{DesignSettings, DesignType};
use crate::strategy::OptimalSolver;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0;

/// Builder for generating MaxDiff designs.
///
/// Starts from [`DesignSettings::default`]; every setter overrides one
/// field. Settings are range-checked in [`DesignBuilder::build`], never in
/// the setters.
#[derive(Debug, Clone, Default)]
pub struct DesignBuilder {
    items: Option<Vec<Item>>,
    settings: DesignSettings,
    seed: Option<u64>,
    optimal: Option<OptimalSolver>,
}

impl DesignBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the item list.
    #[must_use]
    pub fn items(mut self, items: Vec<Item>) -> Self {
        self.items = Some(items);
        self
    }

    /// Set the item list from plain ids, all included, no anchor.
    #[must_use]
    pub fn item_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items(ids.into_iter().map(Item::new).collect())
    }

    /// Replace all settings at once.
    #[must_use]
    pub fn settings(mut self, settings: DesignSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Items shown per task (K).
    #[must_use]
    pub fn items_per_task(mut self, k: usize) -> Self {
        self.settings.items_per_task = k;
        self
    }

    /// Tasks per respondent (T).
    #[must_use]
    pub fn tasks_per_respondent(mut self, tasks: usize) -> Self {
        self.settings.tasks_per_respondent = tasks;
        self
    }

    /// Number of design versions.
    #[must_use]
    pub fn num_versions(mut self, versions: usize) -> Self {
        self.settings.num_versions = versions;
        self
    }

    /// Generation strategy.
    #[must_use]
    pub fn design_type(mut self, design_type: DesignType) -> Self {
        self.settings.design_type = design_type;
        self
    }

    /// Efficiency the Balanced search stops at.
    #[must_use]
    pub fn efficiency_threshold(mut self, threshold: f64) -> Self {
        self.settings.efficiency_threshold = threshold;
        self
    }

    /// Iteration budget; the Balanced search draws `max_iterations / 100`
    /// candidates, at most 100.
    #[must_use]
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.settings.max_iterations = iterations;
        self
    }

    /// Shuffle task order within each version.
    #[must_use]
    pub fn randomize_task_order(mut self, enabled: bool) -> Self {
        self.settings.randomize_task_order = enabled;
        self
    }

    /// Shuffle item slots within each task.
    #[must_use]
    pub fn randomize_item_order(mut self, enabled: bool) -> Self {
        self.settings.randomize_item_order_within_task = enabled;
        self
    }

    /// Random seed. Defaults to [`DEFAULT_SEED`].
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Solver used for [`DesignType::Optimal`].
    #[must_use]
    pub fn optimal_solver(mut self, solver: OptimalSolver) -> Self {
        self.optimal = Some(solver);
        self
    }

    /// Validate the inputs and generate the design.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no items were given,
    /// [`Error::InvalidItems`] for a malformed item list, and any error of
    /// [`DesignGenerator::generate`].
    pub fn build(self) -> Result<GeneratedDesign> {
        let items = self
            .items
            .ok_or_else(|| Error::configuration("items must be specified"))?;
        let items = ItemSet::new(items)?;

        let mut generator = DesignGenerator::new(self.settings);
        if let Some(solver) = self.optimal {
            generator = generator.with_optimal_solver(solver);
        }
        generator.generate(&items, self.seed.unwrap_or(DEFAULT_SEED))
    }
}

/// Convenience function for a single-version Balanced design.
///
/// # Example
///
/// ```
/// use maxdiff::generate_design;
///
/// let design = generate_design(&["A", "B", "C", "D", "E", "F"], 3, 8, 1).unwrap();
/// assert_eq!(design.table.len(), 8);
/// ```
///
/// # Errors
///
/// Same as [`DesignBuilder::build`].
pub fn generate_design(
    ids: &[&str],
    items_per_task: usize,
    tasks_per_respondent: usize,
    seed: u64,
) -> Result<GeneratedDesign> {
    DesignBuilder::new()
        .item_ids(ids.iter().copied())
        .items_per_task(items_per_task)
        .tasks_per_respondent(tasks_per_respondent)
        .seed(seed)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let design = DesignBuilder::new()
            .item_ids(["A", "B", "C", "D", "E", "F"])
            .items_per_task(3)
            .tasks_per_respondent(6)
            .num_versions(2)
            .seed(7)
            .build()
            .unwrap();

        assert_eq!(design.table.len(), 12);
        assert_eq!(design.table.items_per_task(), 3);
        assert_eq!(design.summary.num_versions, 2);
    }

    #[test]
    fn test_builder_requires_items() {
        let err = DesignBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_builder_rejects_bad_items() {
        let err = DesignBuilder::new()
            .item_ids(["A", "A", "B"])
            .items_per_task(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidItems { .. }));
    }

    #[test]
    fn test_builder_checks_settings() {
        let err = DesignBuilder::new()
            .item_ids(["A", "B", "C", "D"])
            .items_per_task(2)
            .efficiency_threshold(0.2)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("efficiencyThreshold"));
    }

    #[test]
    fn test_builder_without_randomization_keeps_task_order() {
        let design = DesignBuilder::new()
            .item_ids(["A", "B", "C", "D", "E"])
            .items_per_task(3)
            .tasks_per_respondent(5)
            .randomize_task_order(false)
            .randomize_item_order(false)
            .build()
            .unwrap();
        let numbers: Vec<usize> = design.table.rows().iter().map(|r| r.task_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_builder_optimal_solver_override() {
        let design = DesignBuilder::new()
            .item_ids(["A", "B", "C", "D", "E", "F"])
            .items_per_task(3)
            .tasks_per_respondent(10)
            .design_type(DesignType::Optimal)
            .optimal_solver(OptimalSolver::unavailable())
            .build()
            .unwrap();
        assert_eq!(design.report.strategy, "Balanced");
        assert!(!design.report.degradations.is_empty());
    }

    #[test]
    fn test_generate_design() {
        let design = generate_design(&["W", "X", "Y", "Z"], 2, 6, 3).unwrap();
        assert_eq!(design.table.len(), 6);
        assert_eq!(design.diagnostics.total_item_appearances(), 12);
    }
}
