//! Structural and balance validation of design tables.
//!
//! Validation never stops at the first problem: every finding is collected.
//! [`ValidationIssue`]s are fatal and make the result invalid;
//! [`ValidationWarning`]s ride along with a usable design.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::diagnostics::{DesignDiagnostics, DiagnosticsSummary};
use super::frame::{item_column, DesignFrame, TASK_COLUMN, VERSION_COLUMN};
use super::{DesignRow, DesignTable};
use crate::error::{Error, Result};
use crate::items::ItemSet;

/// Item-frequency coefficient of variation above which a warning is raised.
pub const ITEM_CV_THRESHOLD: f64 = 0.2;
/// Pair-frequency coefficient of variation above which a warning is raised.
pub const PAIR_CV_THRESHOLD: f64 = 0.3;
/// Largest tolerated ratio between the most and least shown item.
pub const MAX_FREQUENCY_RATIO: f64 = 3.0;

/// A fatal finding. Row numbers are 1-based data rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationIssue {
    /// A required cell is empty or `NA`.
    MissingValue {
        /// Data row.
        row: usize,
        /// Column header.
        column: String,
    },
    /// `Version` or `Task_Number` is not a positive integer.
    InvalidNumber {
        /// Data row.
        row: usize,
        /// Column header.
        column: String,
        /// Offending cell text.
        value: String,
    },
    /// The same item fills two slots of one task.
    DuplicateItem {
        /// Data row.
        row: usize,
        /// Repeated item id.
        item: String,
    },
    /// An item id that is not configured at all.
    UnknownItem {
        /// Data row.
        row: usize,
        /// Unrecognised id.
        item: String,
    },
    /// Task numbers of a version are not exactly `1..=count`.
    TaskNumbering {
        /// Version label.
        version: usize,
        /// Task numbers found, ascending.
        found: Vec<usize>,
    },
    /// Most/least shown item ratio exceeds [`MAX_FREQUENCY_RATIO`].
    FrequencyRatio {
        /// Most shown item.
        most_shown: String,
        /// Its count.
        max: usize,
        /// Least shown included item, possibly never shown.
        least_shown: String,
        /// Its count.
        min: usize,
        /// `max / min`.
        ratio: f64,
    },
}

impl ValidationIssue {
    /// Whether this is the balance refusal rather than a structural defect.
    #[must_use]
    pub fn is_balance_refusal(&self) -> bool {
        matches!(self, Self::FrequencyRatio { .. })
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue { row, column } => {
                write!(f, "row {row}: missing value in '{column}'")
            }
            Self::InvalidNumber { row, column, value } => {
                write!(f, "row {row}: '{value}' in '{column}' is not a positive integer")
            }
            Self::DuplicateItem { row, item } => {
                write!(f, "row {row}: item '{item}' appears more than once in the task")
            }
            Self::UnknownItem { row, item } => {
                write!(f, "row {row}: item '{item}' is not a configured item")
            }
            Self::TaskNumbering { version, found } => write!(
                f,
                "version {version}: task numbers {found:?} are not 1..={}",
                found.len()
            ),
            Self::FrequencyRatio {
                most_shown,
                max,
                least_shown,
                min: 0,
                ..
            } => write!(
                f,
                "item '{least_shown}' is never shown while '{most_shown}' is shown {max} times \
                 (ratio exceeds {MAX_FREQUENCY_RATIO}:1)"
            ),
            Self::FrequencyRatio {
                most_shown,
                max,
                least_shown,
                min,
                ratio,
            } => write!(
                f,
                "item '{most_shown}' shown {max} times vs '{least_shown}' shown {min} times \
                 (ratio {ratio:.2} exceeds {MAX_FREQUENCY_RATIO}:1)"
            ),
        }
    }
}

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationWarning {
    /// An included item never appears in the design.
    ItemNeverShown {
        /// The item.
        item: String,
    },
    /// A configured but excluded item appears in the design.
    ExcludedItemShown {
        /// The item.
        item: String,
        /// Appearances.
        count: usize,
    },
    /// Item frequencies vary more than [`ITEM_CV_THRESHOLD`].
    ItemFrequencyCv {
        /// Observed coefficient of variation.
        cv: f64,
        /// Observed minimum frequency.
        min: usize,
        /// Observed maximum frequency.
        max: usize,
        /// Expected frequency under perfect balance.
        expected: f64,
    },
    /// Pair frequencies vary more than [`PAIR_CV_THRESHOLD`].
    PairFrequencyCv {
        /// Observed coefficient of variation.
        cv: f64,
        /// Expected co-occurrences per pair.
        expected: f64,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemNeverShown { item } => {
                write!(f, "included item '{item}' never appears in the design")
            }
            Self::ExcludedItemShown { item, count } => {
                write!(f, "excluded item '{item}' appears {count} times in the design")
            }
            Self::ItemFrequencyCv {
                cv,
                min,
                max,
                expected,
            } => write!(
                f,
                "item frequency CV {cv:.3} exceeds {ITEM_CV_THRESHOLD} \
                 (observed {min}..{max}, expected {expected:.2})"
            ),
            Self::PairFrequencyCv { cv, expected } => write!(
                f,
                "pair frequency CV {cv:.3} exceeds {PAIR_CV_THRESHOLD} \
                 (expected {expected:.2} per pair)"
            ),
        }
    }
}

/// Outcome of validating a design.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationResult {
    /// `true` when there are no issues.
    pub valid: bool,
    /// Fatal findings.
    pub issues: Vec<ValidationIssue>,
    /// Non-fatal findings.
    pub warnings: Vec<ValidationWarning>,
    /// Diagnostics digest; absent when the rows could not be read at all.
    pub summary: Option<DiagnosticsSummary>,
}

impl ValidationResult {
    fn from_findings(
        issues: Vec<ValidationIssue>,
        warnings: Vec<ValidationWarning>,
        summary: Option<DiagnosticsSummary>,
    ) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
            warnings,
            summary,
        }
    }

    /// Issues as display strings.
    #[must_use]
    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Warnings as display strings.
    #[must_use]
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Turn fatal findings into an error.
    ///
    /// # Errors
    ///
    /// [`Error::StructuralValidation`] listing every structural issue if any
    /// exist; otherwise [`Error::BalanceRefusal`] if the frequency ratio is
    /// exceeded.
    pub fn ensure_valid(self) -> Result<Self> {
        let structural: Vec<String> = self
            .issues
            .iter()
            .filter(|i| !i.is_balance_refusal())
            .map(ToString::to_string)
            .collect();
        if !structural.is_empty() {
            return Err(Error::structural(structural.join("; ")));
        }

        if let Some(ValidationIssue::FrequencyRatio {
            most_shown,
            max,
            least_shown,
            min,
            ratio,
        }) = self.issues.iter().find(|i| i.is_balance_refusal())
        {
            return Err(Error::BalanceRefusal {
                most_shown: most_shown.clone(),
                max: *max,
                least_shown: least_shown.clone(),
                min: *min,
                ratio: *ratio,
            });
        }

        Ok(self)
    }
}

/// Validate a well-formed design table against the configured items.
#[must_use]
pub fn validate_table(table: &DesignTable, items: &ItemSet) -> ValidationResult {
    let diagnostics = DesignDiagnostics::compute(table, items.included_ids());
    validate_with_diagnostics(table, items, &diagnostics)
}

/// [`validate_table`] reusing already computed diagnostics.
pub(crate) fn validate_with_diagnostics(
    table: &DesignTable,
    items: &ItemSet,
    diagnostics: &DesignDiagnostics,
) -> ValidationResult {
    let mut issues = structural_issues(table, items);
    let mut warnings = Vec::new();

    for (id, &count) in &diagnostics.item_frequency {
        if items.is_included(id) {
            if count == 0 {
                warnings.push(ValidationWarning::ItemNeverShown { item: id.clone() });
            }
        } else if items.is_known(id) && count > 0 {
            warnings.push(ValidationWarning::ExcludedItemShown {
                item: id.clone(),
                count,
            });
        }
    }

    let summary = diagnostics.summary();
    if diagnostics.item_frequency_cv > ITEM_CV_THRESHOLD {
        warnings.push(ValidationWarning::ItemFrequencyCv {
            cv: diagnostics.item_frequency_cv,
            min: summary.min_item_frequency,
            max: summary.max_item_frequency,
            expected: diagnostics.expected_item_frequency,
        });
    }
    if diagnostics.pair_frequency_cv > PAIR_CV_THRESHOLD {
        warnings.push(ValidationWarning::PairFrequencyCv {
            cv: diagnostics.pair_frequency_cv,
            expected: diagnostics.expected_pair_frequency,
        });
    }

    if let Some(refusal) = frequency_ratio_issue(&diagnostics.item_frequency, items) {
        issues.push(refusal);
    }

    tracing::debug!(
        issues = issues.len(),
        warnings = warnings.len(),
        d_efficiency = diagnostics.d_efficiency,
        "validated design table"
    );

    ValidationResult::from_findings(issues, warnings, Some(summary))
}

/// Validate an externally supplied design.
///
/// The item-slot count K is taken from the frame's `ItemN_ID` columns.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if a required column is missing. All
/// other problems are reported in the returned [`ValidationResult`].
pub fn validate_frame(frame: &DesignFrame, items: &ItemSet) -> Result<ValidationResult> {
    let layout = frame.layout()?;
    let mut issues = Vec::new();
    let mut rows = Vec::with_capacity(frame.rows().len());

    for r in 0..frame.rows().len() {
        let row_no = r + 1;
        let version = read_number(frame, r, layout.version, VERSION_COLUMN, &mut issues);
        let task = read_number(frame, r, layout.task, TASK_COLUMN, &mut issues);

        let mut ids = Vec::with_capacity(layout.items.len());
        for (slot, &col) in layout.items.iter().enumerate() {
            match frame.cell(r, col) {
                Some(id) => ids.push(id.to_string()),
                None => issues.push(ValidationIssue::MissingValue {
                    row: row_no,
                    column: item_column(slot + 1),
                }),
            }
        }

        if let (Some(version), Some(task_number)) = (version, task) {
            if ids.len() == layout.items.len() {
                rows.push(DesignRow {
                    version,
                    task_number,
                    items: ids,
                });
            }
        }
    }

    if !issues.is_empty() {
        return Ok(ValidationResult::from_findings(issues, Vec::new(), None));
    }

    let table = DesignTable::new(layout.items.len(), rows)?;
    Ok(validate_table(&table, items))
}

fn read_number(
    frame: &DesignFrame,
    row: usize,
    col: usize,
    column: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<usize> {
    let Some(cell) = frame.cell(row, col) else {
        issues.push(ValidationIssue::MissingValue {
            row: row + 1,
            column: column.to_string(),
        });
        return None;
    };

    // Spreadsheet readers often hand integers over as "3.0".
    let text = cell.strip_suffix(".0").unwrap_or(cell);
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            issues.push(ValidationIssue::InvalidNumber {
                row: row + 1,
                column: column.to_string(),
                value: cell.to_string(),
            });
            None
        }
    }
}

fn structural_issues(table: &DesignTable, items: &ItemSet) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (r, row) in table.rows().iter().enumerate() {
        let mut seen = HashSet::with_capacity(row.items.len());
        for id in &row.items {
            if !items.is_known(id) {
                issues.push(ValidationIssue::UnknownItem {
                    row: r + 1,
                    item: id.clone(),
                });
            }
            if !seen.insert(id.as_str()) {
                issues.push(ValidationIssue::DuplicateItem {
                    row: r + 1,
                    item: id.clone(),
                });
            }
        }
    }

    let mut by_version: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for row in table.rows() {
        by_version.entry(row.version).or_default().push(row.task_number);
    }
    for (version, mut found) in by_version {
        found.sort_unstable();
        if !found.iter().copied().eq(1..=found.len()) {
            issues.push(ValidationIssue::TaskNumbering { version, found });
        }
    }

    issues
}

/// Compare the most and least shown included items. An included item that
/// never appears makes the ratio unbounded.
fn frequency_ratio_issue(
    frequency: &BTreeMap<String, usize>,
    items: &ItemSet,
) -> Option<ValidationIssue> {
    let support = frequency.iter().filter(|(id, _)| items.is_included(id));
    let (most_shown, &max) = support.clone().max_by_key(|&(_, c)| *c)?;
    let (least_shown, &min) = support.min_by_key(|&(_, c)| *c)?;
    if max == 0 {
        return None;
    }

    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    (ratio > MAX_FREQUENCY_RATIO).then(|| ValidationIssue::FrequencyRatio {
        most_shown: most_shown.clone(),
        max,
        least_shown: least_shown.clone(),
        min,
        ratio,
    })
}
