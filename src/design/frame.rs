//! Loosely typed design tables as they arrive from outside.
//!
//! A [`DesignFrame`] is a header plus rows of optional cells. It makes no
//! promises about content; [`super::validate_frame`] decides whether it is a
//! usable design.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Header of the version column.
pub const VERSION_COLUMN: &str = "Version";
/// Header of the task-number column.
pub const TASK_COLUMN: &str = "Task_Number";

/// Header of the item column for 1-based display slot `slot`.
///
/// ```
/// assert_eq!(maxdiff::design::item_column(3), "Item3_ID");
/// ```
#[must_use]
pub fn item_column(slot: usize) -> String {
    format!("Item{slot}_ID")
}

/// Parse `ItemN_ID` into `N`.
fn item_slot(header: &str) -> Option<usize> {
    header
        .strip_prefix("Item")?
        .strip_suffix("_ID")?
        .parse()
        .ok()
        .filter(|&n| n >= 1)
}

/// Header and rows of an externally supplied design.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignFrame {
    header: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Column positions of the required design columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FrameLayout {
    pub version: usize,
    pub task: usize,
    /// Column index of `Item1_ID` … `ItemK_ID`, in slot order.
    pub items: Vec<usize>,
}

impl DesignFrame {
    /// Build a frame. Blank cells and `NA` (any case) are treated as missing.
    #[must_use]
    pub fn new(header: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        cell.map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("na"))
                    })
                    .collect()
            })
            .collect();
        Self { header, rows }
    }

    /// Build a frame from plain string cells.
    #[must_use]
    pub fn from_strings<H, R, S>(header: H, rows: R) -> Self
    where
        H: IntoIterator<Item = S>,
        R: IntoIterator<Item = Vec<S>>,
        S: Into<String>,
    {
        Self::new(
            header.into_iter().map(Into::into).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(|c| Some(c.into())).collect())
                .collect(),
        )
    }

    /// Column headers.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rows of cells; `None` is a missing value.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// A cell, `None` if missing or the row is short.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Locate `Version`, `Task_Number` and the contiguous `Item1_ID` …
    /// `ItemK_ID` columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a required column is missing or
    /// the item columns are not numbered `1..=K` without gaps.
    pub(crate) fn layout(&self) -> Result<FrameLayout> {
        let find = |name: &str| {
            self.header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "design is missing required column '{name}' (found: {})",
                        self.header.join(", ")
                    ))
                })
        };
        let version = find(VERSION_COLUMN)?;
        let task = find(TASK_COLUMN)?;

        let mut slots: Vec<(usize, usize)> = self
            .header
            .iter()
            .enumerate()
            .filter_map(|(col, h)| item_slot(h.trim()).map(|slot| (slot, col)))
            .collect();
        slots.sort_unstable();

        if slots.is_empty() {
            return Err(Error::configuration(format!(
                "design is missing item columns ('{}', '{}', ...)",
                item_column(1),
                item_column(2)
            )));
        }
        for (expected, &(slot, _)) in (1..).zip(&slots) {
            if slot != expected {
                return Err(Error::configuration(format!(
                    "design is missing required column '{}'",
                    item_column(expected)
                )));
            }
        }

        Ok(FrameLayout {
            version,
            task,
            items: slots.into_iter().map(|(_, col)| col).collect(),
        })
    }
}
