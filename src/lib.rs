//! # MaxDiff
//!
//! Design generation, diagnostics and validation for best-worst scaling
//! (MaxDiff) surveys.
//!
//! ## Overview
//!
//! In a MaxDiff survey each respondent sees a series of tasks. Every task
//! shows `K` items from a larger list and asks for the best and the worst
//! of them. A good design shows every item about equally often and every
//! pair of items together about equally often.
//!
//! This library provides:
//! - Three generation strategies: Balanced (count-weighted search), Random,
//!   and Optimal (exchange search over all possible tasks)
//! - Seeded, reproducible generation with task and item order randomization
//! - Item, pair and position frequency diagnostics with an efficiency score
//! - Validation of generated or externally loaded designs, including a hard
//!   refusal of designs whose item frequencies differ by more than 3:1
//!
//! ## Quick Start
//!
//! ```rust
//! use maxdiff::DesignBuilder;
//!
//! let design = DesignBuilder::new()
//!     .item_ids(["A", "B", "C", "D", "E", "F", "G", "H"])
//!     .items_per_task(4)
//!     .tasks_per_respondent(10)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(design.table.len(), 10);
//! assert!(design.diagnostics.d_efficiency > 0.0);
//! println!("{}", design.table);
//! ```
//!
//! Validating a design read from elsewhere:
//!
//! ```rust
//! use maxdiff::{validate_frame, DesignFrame, ItemSet};
//!
//! let items = ItemSet::from_ids(["A", "B", "C"]).unwrap();
//! let frame = DesignFrame::from_strings(
//!     ["Version", "Task_Number", "Item1_ID", "Item2_ID"],
//!     [
//!         vec!["1", "1", "A", "B"],
//!         vec!["1", "2", "B", "C"],
//!         vec!["1", "3", "C", "A"],
//!     ],
//! );
//!
//! let result = validate_frame(&frame, &items).unwrap();
//! assert!(result.valid);
//! ```
//!
//! ## Notation
//!
//! - **n**: number of included items
//! - **K**: items per task
//! - **T**: tasks per respondent
//! - **V**: number of versions; the design has `V × T` rows
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of design records
//! - `parallel`: Score exchange candidates in parallel using rayon

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod design;
pub mod error;
pub mod generator;
pub mod items;
pub mod postprocess;
pub mod settings;
pub mod strategy;
pub mod utils;

#[cfg(feature = "parallel")]
mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::{generate_design, DesignBuilder};
    pub use crate::design::{
        validate_frame, validate_table, DesignDiagnostics, DesignFrame, DesignRow, DesignSummary,
        DesignTable, ValidationIssue, ValidationResult, ValidationWarning,
    };
    pub use crate::error::{Error, Result};
    pub use crate::generator::{DesignGenerator, GeneratedDesign, GenerationReport};
    pub use crate::items::{Item, ItemSet};
    pub use crate::postprocess::PostProcessor;
    pub use crate::settings::{DesignSettings, DesignType};
    pub use crate::strategy::{
        Balanced, DesignRng, DesignStrategy, ExchangeOptimizer, FedorovExchange, OptimalSolver,
        RandomSampler,
    };
}

// Re-export commonly used items at crate root
pub use builder::{generate_design, DesignBuilder};
pub use design::{
    validate_frame, validate_table, DesignDiagnostics, DesignFrame, DesignRow, DesignTable,
    ValidationResult,
};
pub use error::{Error, Result};
pub use generator::{DesignGenerator, GeneratedDesign};
pub use items::{Item, ItemSet};
pub use settings::{DesignSettings, DesignType};
