//! Display randomization applied after generation.
//!
//! Neither step changes design content: task shuffling permutes whole rows
//! within a version and renumbers them `1..=T`; item shuffling permutes the
//! slots of each row.

use rand::seq::SliceRandom;

use crate::design::{DesignRow, DesignTable};
use crate::settings::DesignSettings;
use crate::strategy::DesignRng;

/// Applies task-order and item-order randomization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostProcessor {
    /// Shuffle rows within each version.
    pub randomize_task_order: bool,
    /// Shuffle slots within each row.
    pub randomize_item_order: bool,
}

impl PostProcessor {
    /// Post-processor configured from the randomization settings.
    #[must_use]
    pub fn from_settings(settings: &DesignSettings) -> Self {
        Self {
            randomize_task_order: settings.randomize_task_order,
            randomize_item_order: settings.randomize_item_order_within_task,
        }
    }

    /// Apply the enabled steps in place. Task order is shuffled first.
    pub fn apply(&self, table: &mut DesignTable, rng: &mut DesignRng) {
        if self.randomize_task_order {
            shuffle_tasks(table.rows_mut(), rng);
        }
        if self.randomize_item_order {
            for row in table.rows_mut().iter_mut() {
                row.items.shuffle(rng);
            }
        }
    }
}

/// Shuffle each version's rows and renumber them from 1. Versions keep
/// their relative order.
fn shuffle_tasks(rows: &mut Vec<DesignRow>, rng: &mut DesignRng) {
    let mut versions: Vec<usize> = rows.iter().map(|r| r.version).collect();
    versions.dedup();

    let mut taken = std::mem::take(rows);
    for version in versions {
        let (mut block, rest): (Vec<DesignRow>, Vec<DesignRow>) =
            taken.into_iter().partition(|r| r.version == version);
        taken = rest;
        if block.is_empty() {
            continue;
        }
        block.shuffle(rng);
        for (number, row) in (1..).zip(block.iter_mut()) {
            row.task_number = number;
        }
        rows.extend(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::RawDesign;
    use rand::SeedableRng;

    fn table() -> DesignTable {
        let ids: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| (*s).to_string()).collect();
        RawDesign::from_versions(
            &[
                vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 0]],
                vec![vec![4, 0, 1], vec![0, 2, 4], vec![1, 3, 4], vec![0, 1, 3]],
            ],
            3,
        )
        .unwrap()
        .to_table(&ids)
    }

    fn sorted_rows(table: &DesignTable, version: usize) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = table
            .rows_for_version(version)
            .map(|r| {
                let mut items = r.items.clone();
                items.sort();
                items
            })
            .collect();
        rows.sort();
        rows
    }

    #[test]
    fn test_disabled_is_noop() {
        let mut t = table();
        let before = t.clone();
        PostProcessor::default().apply(&mut t, &mut DesignRng::seed_from_u64(0));
        assert_eq!(t, before);
    }

    #[test]
    fn test_task_shuffle_preserves_rows_per_version() {
        let original = table();
        let mut t = original.clone();
        let post = PostProcessor {
            randomize_task_order: true,
            randomize_item_order: false,
        };
        post.apply(&mut t, &mut DesignRng::seed_from_u64(17));

        for v in [1, 2] {
            let mut block: Vec<&DesignRow> = t.rows_for_version(v).collect();
            assert_eq!(block.len(), 4);
            block.sort_by_key(|r| r.task_number);
            let numbers: Vec<usize> = block.iter().map(|r| r.task_number).collect();
            assert_eq!(numbers, vec![1, 2, 3, 4]);

            let mut after: Vec<Vec<String>> =
                t.rows_for_version(v).map(|r| r.items.clone()).collect();
            let mut before: Vec<Vec<String>> =
                original.rows_for_version(v).map(|r| r.items.clone()).collect();
            after.sort();
            before.sort();
            assert_eq!(after, before);
        }
    }

    #[test]
    fn test_item_shuffle_preserves_membership() {
        let original = table();
        let mut t = original.clone();
        let post = PostProcessor {
            randomize_task_order: false,
            randomize_item_order: true,
        };
        post.apply(&mut t, &mut DesignRng::seed_from_u64(5));

        for (a, b) in t.rows().iter().zip(original.rows()) {
            assert_eq!(a.version, b.version);
            assert_eq!(a.task_number, b.task_number);
            let mut x = a.items.clone();
            let mut y = b.items.clone();
            x.sort();
            y.sort();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_both_steps_preserve_content() {
        let original = table();
        let mut t = original.clone();
        let post = PostProcessor {
            randomize_task_order: true,
            randomize_item_order: true,
        };
        post.apply(&mut t, &mut DesignRng::seed_from_u64(99));
        assert_eq!(t.len(), original.len());
        for v in [1, 2] {
            assert_eq!(sorted_rows(&t, v), sorted_rows(&original, v));
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let post = PostProcessor {
            randomize_task_order: true,
            randomize_item_order: true,
        };
        let mut a = table();
        let mut b = table();
        post.apply(&mut a, &mut DesignRng::seed_from_u64(3));
        post.apply(&mut b, &mut DesignRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
