//! Items shown in choice tasks.
//!
//! An [`ItemSet`] is the validated list of configured items. Only items with
//! `include = true` take part in design generation; excluded items stay
//! "known" so that an externally supplied design referencing them is not
//! mistaken for one referencing garbage ids.

use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single configured item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    /// Unique, non-empty identifier used in design tables.
    pub id: String,
    /// Whether the item takes part in the design.
    pub include: bool,
    /// Reference item for downstream utility estimation.
    pub is_anchor: bool,
    /// Output ordering only; has no effect on generation.
    pub display_order: i64,
}

impl Item {
    /// An included, non-anchor item whose display order is unset (0).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            include: true,
            is_anchor: false,
            display_order: 0,
        }
    }

    /// Set whether the item is included.
    #[must_use]
    pub fn include(mut self, include: bool) -> Self {
        self.include = include;
        self
    }

    /// Mark the item as the anchor.
    #[must_use]
    pub fn anchor(mut self) -> Self {
        self.is_anchor = true;
        self
    }

    /// Set the display order.
    #[must_use]
    pub fn display_order(mut self, order: i64) -> Self {
        self.display_order = order;
        self
    }
}

/// A validated collection of items.
#[derive(Debug, Clone)]
pub struct ItemSet {
    items: Vec<Item>,
    included: Vec<String>,
    included_index: HashMap<String, usize>,
}

impl ItemSet {
    /// Validate and wrap a list of items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidItems`] if an id is empty, an id is repeated,
    /// or more than one item is flagged as anchor.
    pub fn new(items: Vec<Item>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.id.trim().is_empty() {
                return Err(Error::invalid_items("item ids must be non-empty"));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(Error::invalid_items(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
        }

        let anchors: Vec<&str> = items
            .iter()
            .filter(|i| i.is_anchor)
            .map(|i| i.id.as_str())
            .collect();
        if anchors.len() > 1 {
            return Err(Error::invalid_items(format!(
                "at most one anchor item is allowed, found {}: {}",
                anchors.len(),
                anchors.join(", ")
            )));
        }

        let included: Vec<String> = items
            .iter()
            .filter(|i| i.include)
            .map(|i| i.id.clone())
            .collect();
        let included_index = included
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();

        Ok(Self {
            items,
            included,
            included_index,
        })
    }

    /// Build an item set where every id is included.
    ///
    /// # Errors
    ///
    /// Same as [`ItemSet::new`].
    pub fn from_ids<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(Item::new).collect())
    }

    /// All configured items in input order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Ids of included items, in input order. Index positions are the item
    /// indices used by the internal design matrix.
    #[must_use]
    pub fn included_ids(&self) -> &[String] {
        &self.included
    }

    /// Number of included items.
    #[must_use]
    pub fn n_included(&self) -> usize {
        self.included.len()
    }

    /// Position of an included item in [`ItemSet::included_ids`].
    #[must_use]
    pub fn included_index(&self, id: &str) -> Option<usize> {
        self.included_index.get(id).copied()
    }

    /// Whether `id` is a configured item (included or not).
    #[must_use]
    pub fn is_known(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    /// Whether `id` is an included item.
    #[must_use]
    pub fn is_included(&self, id: &str) -> bool {
        self.included_index.contains_key(id)
    }

    /// The anchor item, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&Item> {
        self.items.iter().find(|i| i.is_anchor)
    }

    /// Items sorted by `display_order` (stable for ties).
    #[must_use]
    pub fn by_display_order(&self) -> Vec<&Item> {
        let mut sorted: Vec<&Item> = self.items.iter().collect();
        sorted.sort_by_key(|i| i.display_order);
        sorted
    }
}
