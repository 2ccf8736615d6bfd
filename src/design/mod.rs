//! Design tables and their diagnostics.
//!
//! ## Overview
//!
//! - [`RawDesign`]: item-index matrix used during generation and scoring
//! - [`DesignTable`]: the id-based table handed to collaborators, with
//!   columns `Version`, `Task_Number`, `Item1_ID` … `ItemK_ID`
//! - [`DesignFrame`]: loosely typed rows of an externally supplied design
//! - [`DesignDiagnostics`]: frequency tables and efficiency, recomputable
//!   from any table
//! - [`validate_table`] / [`validate_frame`]: structural and balance checks

mod diagnostics;
mod frame;
mod stats;
mod verify;

pub use diagnostics::{DesignDiagnostics, DiagnosticsSummary, PairFrequency};
pub use frame::{item_column, DesignFrame, TASK_COLUMN, VERSION_COLUMN};
pub use stats::{evaluate_efficiency, pair_frequencies, EfficiencyReport};
pub use verify::{
    validate_frame, validate_table, ValidationIssue, ValidationResult, ValidationWarning,
    ITEM_CV_THRESHOLD, MAX_FREQUENCY_RATIO, PAIR_CV_THRESHOLD,
};
pub(crate) use verify::validate_with_diagnostics;

use std::collections::BTreeSet;
use std::fmt;

use ndarray::{Array2, ArrayView1};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::settings::DesignType;

/// A design as a matrix of item indices.
///
/// Row `r` is one task; column `k` is display slot `k + 1`. Item indices
/// refer to a support list of ids held by the caller (usually
/// [`crate::ItemSet::included_ids`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDesign {
    data: Array2<usize>,
    versions: Vec<usize>,
}

impl RawDesign {
    /// Wrap an index matrix whose rows belong to the given versions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GenerationFailed`] if `versions` does not have one
    /// entry per row.
    pub fn new(data: Array2<usize>, versions: Vec<usize>) -> Result<Self> {
        if versions.len() != data.nrows() {
            return Err(Error::generation_failed(format!(
                "{} version labels for {} rows",
                versions.len(),
                data.nrows()
            )));
        }
        Ok(Self { data, versions })
    }

    /// Build from per-version task lists, each task holding `k` item indices.
    ///
    /// Versions are numbered from 1 in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GenerationFailed`] if there are no tasks or a task
    /// does not hold exactly `k` items.
    pub fn from_versions(versions: &[Vec<Vec<usize>>], k: usize) -> Result<Self> {
        let n_rows: usize = versions.iter().map(Vec::len).sum();
        if n_rows == 0 {
            return Err(Error::generation_failed("design has no tasks"));
        }

        let mut flat = Vec::with_capacity(n_rows * k);
        let mut labels = Vec::with_capacity(n_rows);
        for (v, tasks) in versions.iter().enumerate() {
            for task in tasks {
                if task.len() != k {
                    return Err(Error::generation_failed(format!(
                        "task in version {} holds {} items, expected {}",
                        v + 1,
                        task.len(),
                        k
                    )));
                }
                flat.extend_from_slice(task);
                labels.push(v + 1);
            }
        }

        let data = Array2::from_shape_vec((n_rows, k), flat)
            .map_err(|e| Error::generation_failed(e.to_string()))?;
        Self::new(data, labels)
    }

    /// Number of rows (tasks across all versions).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Items per task.
    #[must_use]
    pub fn items_per_task(&self) -> usize {
        self.data.ncols()
    }

    /// The underlying index matrix.
    #[must_use]
    pub fn data(&self) -> &Array2<usize> {
        &self.data
    }

    /// Version label (1-based) of every row.
    #[must_use]
    pub fn versions(&self) -> &[usize] {
        &self.versions
    }

    /// One task.
    #[must_use]
    pub fn row(&self, idx: usize) -> ArrayView1<'_, usize> {
        self.data.row(idx)
    }

    /// Iterate over tasks.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, usize>> {
        self.data.rows().into_iter()
    }

    /// Convert to an id-based table. Task numbers follow row order within
    /// each version.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range for `ids`.
    #[must_use]
    pub fn to_table(&self, ids: &[String]) -> DesignTable {
        let mut next_task = std::collections::HashMap::new();
        let rows = self
            .rows()
            .zip(&self.versions)
            .map(|(row, &version)| {
                let task = next_task.entry(version).or_insert(0usize);
                *task += 1;
                DesignRow {
                    version,
                    task_number: *task,
                    items: row.iter().map(|&i| ids[i].clone()).collect(),
                }
            })
            .collect();

        DesignTable {
            items_per_task: self.items_per_task(),
            rows,
        }
    }
}

/// One choice task of a design table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignRow {
    /// Design version (1-based).
    pub version: usize,
    /// Task number within the version (1-based).
    pub task_number: usize,
    /// Item ids by display slot.
    pub items: Vec<String>,
}

/// A design as handed to collaborators.
///
/// Every row holds exactly `items_per_task` ids; deserialization checks
/// this the same way [`DesignTable::new`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TableFields"))]
pub struct DesignTable {
    items_per_task: usize,
    rows: Vec<DesignRow>,
}

/// Unchecked wire form of [`DesignTable`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct TableFields {
    items_per_task: usize,
    rows: Vec<DesignRow>,
}

#[cfg(feature = "serde")]
impl TryFrom<TableFields> for DesignTable {
    type Error = Error;

    fn try_from(fields: TableFields) -> Result<Self> {
        Self::new(fields.items_per_task, fields.rows)
    }
}

impl DesignTable {
    /// Build a table, checking that every row holds `items_per_task` ids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralValidation`] if a row has the wrong width.
    pub fn new(items_per_task: usize, rows: Vec<DesignRow>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.items.len() != items_per_task) {
            return Err(Error::structural(format!(
                "version {} task {} holds {} items, expected {}",
                bad.version,
                bad.task_number,
                bad.items.len(),
                items_per_task
            )));
        }
        Ok(Self {
            items_per_task,
            rows,
        })
    }

    /// Items per task (K).
    #[must_use]
    pub fn items_per_task(&self) -> usize {
        self.items_per_task
    }

    /// All rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[DesignRow] {
        &self.rows
    }

    /// Mutable access for post-processing.
    pub(crate) fn rows_mut(&mut self) -> &mut Vec<DesignRow> {
        &mut self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct version labels, ascending.
    #[must_use]
    pub fn versions(&self) -> Vec<usize> {
        self.rows
            .iter()
            .map(|r| r.version)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows of one version, in table order.
    pub fn rows_for_version(&self, version: usize) -> impl Iterator<Item = &DesignRow> {
        self.rows.iter().filter(move |r| r.version == version)
    }

    /// Column headers: `Version`, `Task_Number`, `Item1_ID` … `ItemK_ID`.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![VERSION_COLUMN.to_string(), TASK_COLUMN.to_string()];
        names.extend((1..=self.items_per_task).map(item_column));
        names
    }

    /// The table as a loosely typed frame, e.g. for a spreadsheet writer.
    #[must_use]
    pub fn to_frame(&self) -> DesignFrame {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = vec![Some(r.version.to_string()), Some(r.task_number.to_string())];
                cells.extend(r.items.iter().cloned().map(Some));
                cells
            })
            .collect();
        DesignFrame::new(self.column_names(), rows)
    }

    /// Map ids to indices in `support`, which must contain every id used.
    pub(crate) fn to_raw(&self, support: &[String]) -> Result<RawDesign> {
        let index: std::collections::HashMap<&str, usize> = support
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut flat = Vec::with_capacity(self.rows.len() * self.items_per_task);
        for row in &self.rows {
            for id in &row.items {
                let idx = index.get(id.as_str()).ok_or_else(|| {
                    Error::structural(format!("item id '{id}' is not a configured item"))
                })?;
                flat.push(*idx);
            }
        }
        let data = Array2::from_shape_vec((self.rows.len(), self.items_per_task), flat)
            .map_err(|e| Error::structural(e.to_string()))?;
        RawDesign::new(data, self.rows.iter().map(|r| r.version).collect())
    }
}

impl fmt::Display for DesignTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.column_names().join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}\t{}\t{}", row.version, row.task_number, row.items.join("\t"))?;
        }
        Ok(())
    }
}

/// Scalar summary of a generated design.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignSummary {
    /// Included items.
    pub n_items: usize,
    /// Items shown per task.
    pub items_per_task: usize,
    /// Tasks per respondent.
    pub tasks_per_respondent: usize,
    /// Number of versions.
    pub num_versions: usize,
    /// Requested strategy.
    pub design_type: DesignType,
    /// Efficiency estimate of the final design.
    pub d_efficiency: f64,
}
