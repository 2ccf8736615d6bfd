//! Property-based tests for maxdiff
//!
//! Uses proptest to verify invariants of generation, diagnostics and
//! post-processing.

use std::collections::HashSet;

use maxdiff::prelude::*;
use maxdiff::strategy::GenerationContext;
use proptest::prelude::*;
use rand::SeedableRng;

/// (n_items, items_per_task, tasks, versions) with K <= n.
fn shape() -> impl Strategy<Value = (usize, usize, usize, usize)> {
    (3usize..10)
        .prop_flat_map(|n| (Just(n), 2usize..=n.min(6), 1usize..16, 1usize..4))
}

fn design_type() -> impl Strategy<Value = DesignType> {
    prop_oneof![
        Just(DesignType::Balanced),
        Just(DesignType::Random),
        Just(DesignType::Optimal),
    ]
}

fn ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("item{i}")).collect()
}

fn settings(k: usize, tasks: usize, versions: usize, design_type: DesignType) -> DesignSettings {
    DesignSettings {
        items_per_task: k,
        tasks_per_respondent: tasks,
        num_versions: versions,
        design_type,
        max_iterations: 1000,
        ..Default::default()
    }
}

fn strategy_for(design_type: DesignType) -> Box<dyn DesignStrategy> {
    match design_type {
        DesignType::Balanced => Box::new(Balanced),
        DesignType::Random => Box::new(RandomSampler),
        DesignType::Optimal => Box::new(OptimalSolver::default()),
    }
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

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // ==================== Generation Properties ====================

    #[test]
    fn rows_hold_k_distinct_included_items(
        (n, k, tasks, versions) in shape(),
        design_type in design_type(),
        seed in any::<u64>()
    ) {
        let s = settings(k, tasks, versions, design_type);
        let ctx = GenerationContext::new(&s, n);
        let mut rng = DesignRng::seed_from_u64(seed);
        let out = strategy_for(design_type).generate(&ctx, &mut rng).unwrap();
        let table = out.design.to_table(&ids(n));

        prop_assert_eq!(table.len(), tasks * versions);
        let known: HashSet<String> = ids(n).into_iter().collect();
        for row in table.rows() {
            let distinct: HashSet<&String> = row.items.iter().collect();
            prop_assert_eq!(distinct.len(), k);
            prop_assert!(row.items.iter().all(|id| known.contains(id)));
        }
    }

    #[test]
    fn item_frequencies_sum_to_cells(
        (n, k, tasks, versions) in shape(),
        design_type in design_type(),
        seed in any::<u64>()
    ) {
        let s = settings(k, tasks, versions, design_type);
        let ctx = GenerationContext::new(&s, n);
        let out = strategy_for(design_type)
            .generate(&ctx, &mut DesignRng::seed_from_u64(seed))
            .unwrap();
        let table = out.design.to_table(&ids(n));
        let diag = DesignDiagnostics::compute(&table, &ids(n));

        prop_assert_eq!(diag.total_item_appearances(), versions * tasks * k);
        prop_assert_eq!(diag.item_frequency.len(), n);
    }

    #[test]
    fn efficiency_within_unit_interval(
        (n, k, tasks, versions) in shape(),
        design_type in design_type(),
        seed in any::<u64>()
    ) {
        let s = settings(k, tasks, versions, design_type);
        let ctx = GenerationContext::new(&s, n);
        let out = strategy_for(design_type)
            .generate(&ctx, &mut DesignRng::seed_from_u64(seed))
            .unwrap();

        prop_assert!((0.0..=1.0).contains(&out.d_efficiency));
        let diag = DesignDiagnostics::compute(&out.design.to_table(&ids(n)), &ids(n));
        prop_assert!((diag.d_efficiency - out.d_efficiency).abs() < 1e-12);
    }

    #[test]
    fn same_seed_same_table(
        (n, k, tasks, versions) in shape(),
        design_type in design_type(),
        seed in any::<u64>()
    ) {
        let gen = DesignGenerator::new(settings(k, tasks, versions, design_type));
        let items = ItemSet::from_ids(ids(n)).unwrap();
        match (gen.generate(&items, seed), gen.generate(&items, seed)) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a.table, b.table),
            (Err(a), Err(b)) => {
                prop_assert!(matches!(a, Error::BalanceRefusal { .. }), "expected BalanceRefusal, got {:?}", a);
                prop_assert_eq!(a, b);
            }
            (a, b) => prop_assert!(false, "diverging outcomes: {:?} vs {:?}", a.is_ok(), b.is_ok()),
        }
    }

    // ==================== Post-processing Properties ====================

    #[test]
    fn task_shuffle_preserves_each_version(
        (n, k, tasks, versions) in shape(),
        seed in any::<u64>()
    ) {
        let s = settings(k, tasks, versions, DesignType::Random);
        let ctx = GenerationContext::new(&s, n);
        let mut rng = DesignRng::seed_from_u64(seed);
        let original = RandomSampler.generate(&ctx, &mut rng).unwrap().design.to_table(&ids(n));

        let mut shuffled = original.clone();
        PostProcessor { randomize_task_order: true, randomize_item_order: false }
            .apply(&mut shuffled, &mut rng);

        for v in 1..=versions {
            prop_assert_eq!(sorted_rows(&shuffled, v), sorted_rows(&original, v));
            let mut numbers: Vec<usize> =
                shuffled.rows_for_version(v).map(|r| r.task_number).collect();
            numbers.sort_unstable();
            prop_assert_eq!(numbers, (1..=tasks).collect::<Vec<_>>());
        }
    }

    #[test]
    fn item_shuffle_preserves_each_row(
        (n, k, tasks, versions) in shape(),
        seed in any::<u64>()
    ) {
        let s = settings(k, tasks, versions, DesignType::Random);
        let ctx = GenerationContext::new(&s, n);
        let mut rng = DesignRng::seed_from_u64(seed);
        let original = RandomSampler.generate(&ctx, &mut rng).unwrap().design.to_table(&ids(n));

        let mut shuffled = original.clone();
        PostProcessor { randomize_task_order: false, randomize_item_order: true }
            .apply(&mut shuffled, &mut rng);

        for (a, b) in shuffled.rows().iter().zip(original.rows()) {
            let x: HashSet<&String> = a.items.iter().collect();
            let y: HashSet<&String> = b.items.iter().collect();
            prop_assert_eq!(x, y);
            prop_assert_eq!(a.task_number, b.task_number);
        }
    }

    // ==================== Validation Properties ====================

    #[test]
    fn frame_roundtrip_validates_like_table(
        (n, k, tasks, versions) in shape(),
        seed in any::<u64>()
    ) {
        let s = settings(k, tasks, versions, DesignType::Balanced);
        let ctx = GenerationContext::new(&s, n);
        let table = Balanced
            .generate(&ctx, &mut DesignRng::seed_from_u64(seed))
            .unwrap()
            .design
            .to_table(&ids(n));
        let items = ItemSet::from_ids(ids(n)).unwrap();

        let from_table = validate_table(&table, &items);
        let from_frame = validate_frame(&table.to_frame(), &items).unwrap();
        prop_assert_eq!(from_table, from_frame);
    }
}
