//! Basic usage example for the maxdiff library.
//!
//! This example generates a Balanced design, prints its diagnostics, and
//! then validates the same design as if it had been loaded from a file.

use maxdiff::{validate_frame, DesignBuilder, DesignType, Item, ItemSet};

fn main() {
    println!("MaxDiff Library - Basic Usage Example\n");

    let items = vec![
        Item::new("Price").display_order(1),
        Item::new("Quality").display_order(2),
        Item::new("Brand").display_order(3),
        Item::new("Warranty").display_order(4),
        Item::new("Delivery").display_order(5),
        Item::new("Support").display_order(6),
        Item::new("Design").display_order(7),
        Item::new("Reviews").display_order(8),
        Item::new("Legacy").include(false),
        Item::new("None of these").anchor(),
    ];

    // 9 included items, 4 per task, 12 tasks, 2 versions
    println!("Generating Balanced design...");
    let design = DesignBuilder::new()
        .items(items.clone())
        .items_per_task(4)
        .tasks_per_respondent(12)
        .num_versions(2)
        .design_type(DesignType::Balanced)
        .seed(42)
        .build()
        .expect("Failed to generate design");

    println!("Design:");
    println!("  Rows: {}", design.table.len());
    println!("  Strategy: {}", design.report.strategy);
    println!("  Candidates drawn: {}", design.report.iterations);
    println!("  D-efficiency: {:.3}", design.diagnostics.d_efficiency);
    println!("  Item frequency CV: {:.3}", design.diagnostics.item_frequency_cv);
    println!("  Pair frequency CV: {:.3}", design.diagnostics.pair_frequency_cv);
    if !design.report.threshold_met {
        println!("  (efficiency threshold {:.2} not reached)", design.report.threshold);
    }
    println!();

    println!("Design contents:");
    println!("{}", design.table);

    println!("Item frequencies:");
    for (id, count) in &design.diagnostics.item_frequency {
        println!("  {id:<14} {count}");
    }
    println!();

    // Validate as an externally supplied design
    println!("Re-validating from tabular form...");
    let set = ItemSet::new(items).expect("Invalid item list");
    let result = validate_frame(&design.table.to_frame(), &set).expect("Missing columns");
    if result.valid {
        println!("✓ Design is valid");
    } else {
        println!("✗ Design failed validation");
        for issue in result.issue_messages() {
            println!("  Issue: {issue}");
        }
    }
    for warning in result.warning_messages() {
        println!("  Warning: {warning}");
    }

    println!();

    // Optimal design with exchange search
    println!("Generating Optimal design...");
    let optimal = DesignBuilder::new()
        .item_ids(["A", "B", "C", "D", "E", "F", "G"])
        .items_per_task(3)
        .tasks_per_respondent(7)
        .design_type(DesignType::Optimal)
        .seed(7)
        .build()
        .expect("Failed to generate design");

    println!("  Strategy: {}", optimal.report.strategy);
    println!("  D-efficiency: {:.3}", optimal.diagnostics.d_efficiency);
    for note in &optimal.report.degradations {
        println!("  Note: {note}");
    }
    println!("{}", optimal.table);
}
