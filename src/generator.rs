//! Generation pipeline: strategy, post-processing, diagnostics, validation.

use rand::SeedableRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::design::{
    validate_with_diagnostics, DesignDiagnostics, DesignSummary, DesignTable, ValidationResult,
};
use crate::error::Result;
use crate::items::ItemSet;
use crate::postprocess::PostProcessor;
use crate::settings::{DesignSettings, DesignType};
use crate::strategy::{
    Balanced, DesignRng, DesignStrategy, GenerationContext, OptimalSolver, RandomSampler,
};

/// How a design came about.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationReport {
    /// Strategy that produced the design (differs from the requested one
    /// after a fallback).
    pub strategy: String,
    /// Candidates drawn or exchange passes run.
    pub iterations: usize,
    /// Requested efficiency threshold.
    pub threshold: f64,
    /// Whether the final design reached it.
    pub threshold_met: bool,
    /// Fallback notes.
    pub degradations: Vec<String>,
}

/// Everything a generation call returns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneratedDesign {
    /// The post-processed design.
    pub table: DesignTable,
    /// Scalar summary.
    pub summary: DesignSummary,
    /// Frequency tables and efficiency.
    pub diagnostics: DesignDiagnostics,
    /// Validation outcome; always valid, but may carry warnings.
    pub validation: ValidationResult,
    /// Strategy, iterations and degradations.
    pub report: GenerationReport,
}

impl GeneratedDesign {
    /// Whether the design is degraded in any way: a fallback happened, the
    /// threshold was missed, or validation raised warnings.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.report.degradations.is_empty()
            || !self.report.threshold_met
            || !self.validation.warnings.is_empty()
    }
}

/// Runs the full generation pipeline for one settings value.
#[derive(Debug, Clone, Default)]
pub struct DesignGenerator {
    settings: DesignSettings,
    optimal: OptimalSolver,
}

impl DesignGenerator {
    /// Generator using the built-in exchange optimizer for Optimal designs.
    #[must_use]
    pub fn new(settings: DesignSettings) -> Self {
        Self {
            settings,
            optimal: OptimalSolver::default(),
        }
    }

    /// Replace the solver used for [`DesignType::Optimal`].
    #[must_use]
    pub fn with_optimal_solver(mut self, solver: OptimalSolver) -> Self {
        self.optimal = solver;
        self
    }

    /// The settings in use.
    #[must_use]
    pub fn settings(&self) -> &DesignSettings {
        &self.settings
    }

    fn strategy(&self) -> &dyn DesignStrategy {
        match self.settings.design_type {
            DesignType::Balanced => &Balanced,
            DesignType::Random => &RandomSampler,
            DesignType::Optimal => &self.optimal,
        }
    }

    /// Generate a design over the included items of `items`.
    ///
    /// Settings are checked before any sampling. The same items, settings
    /// and seed always produce the same table.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Configuration`] for out-of-range settings or more
    ///   items per task than included items
    /// - [`crate::Error::GenerationFailed`] if no candidate could be drawn
    /// - [`crate::Error::StructuralValidation`] or
    ///   [`crate::Error::BalanceRefusal`] if the final design fails
    ///   validation
    pub fn generate(&self, items: &ItemSet, seed: u64) -> Result<GeneratedDesign> {
        let settings = &self.settings;
        settings.validate_for(items.n_included())?;

        let strategy = self.strategy();
        let ctx = GenerationContext::new(settings, items.n_included());
        let mut rng = DesignRng::seed_from_u64(seed);
        tracing::info!(
            strategy = strategy.name(),
            n_items = ctx.n_items,
            items_per_task = settings.items_per_task,
            tasks = settings.tasks_per_respondent,
            versions = settings.num_versions,
            seed,
            "generating design"
        );

        let output = strategy.generate(&ctx, &mut rng)?;
        let mut table = output.design.to_table(items.included_ids());
        PostProcessor::from_settings(settings).apply(&mut table, &mut rng);

        let diagnostics = DesignDiagnostics::compute(&table, items.included_ids());
        let validation = validate_with_diagnostics(&table, items, &diagnostics).ensure_valid()?;
        for warning in &validation.warnings {
            tracing::warn!(%warning, "design balance warning");
        }

        let threshold_met = diagnostics.d_efficiency >= settings.efficiency_threshold;
        if !threshold_met {
            tracing::warn!(
                d_efficiency = diagnostics.d_efficiency,
                threshold = settings.efficiency_threshold,
                iterations = output.iterations,
                "efficiency threshold not reached, returning best design found"
            );
        }
        tracing::info!(
            strategy = output.strategy,
            d_efficiency = diagnostics.d_efficiency,
            item_cv = diagnostics.item_frequency_cv,
            pair_cv = diagnostics.pair_frequency_cv,
            rows = table.len(),
            "design generated"
        );

        let summary = DesignSummary {
            n_items: items.n_included(),
            items_per_task: settings.items_per_task,
            tasks_per_respondent: settings.tasks_per_respondent,
            num_versions: settings.num_versions,
            design_type: settings.design_type,
            d_efficiency: diagnostics.d_efficiency,
        };
        let report = GenerationReport {
            strategy: output.strategy.to_string(),
            iterations: output.iterations,
            threshold: settings.efficiency_threshold,
            threshold_met,
            degradations: output.degradations,
        };

        Ok(GeneratedDesign {
            table,
            summary,
            diagnostics,
            validation,
            report,
        })
    }
}
