//! Integration tests for the data-mining pipeline.
//!
//! These run the full loader -> cleaner -> store -> query -> sink chain
//! against small CSV fixtures.

use campus_processing::{
    Aggregate, CmpOp, Derivation, DeriveExpr, Join, Literal, Pipeline, PipelineConfig, Predicate,
    QueryEngine, QueryPlan, SortKey, TableStore,
};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Run the full pipeline against the fixtures, returning the run config.
fn run_pipeline(root: &std::path::Path) -> PipelineConfig {
    let config = PipelineConfig::builder()
        .data_dir(fixtures_path())
        .store_dir(root.join("cleaned"))
        .output_dir(root.join("results"))
        .build()
        .unwrap();
    let report = Pipeline::new(config.clone()).run().unwrap();
    assert_eq!(report.failed_queries(), 0, "battery should fully succeed");
    config
}

fn cleaned_tables(config: &PipelineConfig) -> HashMap<String, DataFrame> {
    let store = TableStore::new(&config.store_dir).unwrap();
    store
        .list()
        .unwrap()
        .into_iter()
        .map(|name| {
            let df = store.get(&name).unwrap();
            (name, df)
        })
        .collect()
}

fn string_column(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect()
}

// ============================================================================
// End-to-End Cleaning
// ============================================================================

#[test]
fn test_cleaning_dedups_and_flags_presence() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());

    let store = TableStore::new(&config.store_dir).unwrap();
    let cost = store.get("tuition_cost").unwrap();

    // the duplicate Acme College row is gone
    assert_eq!(cost.height(), 5);
    let names = string_column(&cost, "name");
    assert_eq!(
        names.iter().filter(|n| n.as_str() == "Acme College").count(),
        1
    );

    // presence flag mirrors the original null-ness of room_and_board
    let flags: Vec<Option<bool>> = cost
        .column("has_room_and_board_data")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    let rooms = cost.column("room_and_board").unwrap();
    for (i, flag) in flags.iter().enumerate() {
        let is_null = rooms.get(i).unwrap() == AnyValue::Null;
        assert_eq!(flag.unwrap(), !is_null, "row {i}");
    }

    // nulls are preserved, not imputed
    assert_eq!(rooms.null_count(), 2);
}

#[test]
fn test_cleaned_tables_have_no_duplicates_and_lowercase_names() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());

    for (name, df) in cleaned_tables(&config) {
        if name == "historical_tuition" || name == "tuition_income" {
            continue; // passthrough tables keep their source shape
        }
        let deduped = df
            .unique_stable(None, UniqueKeepStrategy::First, None)
            .unwrap();
        assert_eq!(df.height(), deduped.height(), "{name} has duplicates");
        for col in df.get_column_names() {
            assert!(
                col.chars().all(|c| !c.is_uppercase()),
                "{name}.{col} not lowercase"
            );
        }
    }
}

// ============================================================================
// Query Semantics Against Cleaned Tables
// ============================================================================

#[test]
fn test_filter_order_limit_selects_single_correct_row() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());
    let tables = cleaned_tables(&config);

    let plan = QueryPlan {
        name: "priciest_public".to_string(),
        from: "tuition_cost".to_string(),
        filters: vec![Predicate::eq("type", Literal::str("Public"))],
        order_by: vec![SortKey::desc("in_state_tuition")],
        limit: Some(1),
        ..QueryPlan::default()
    };
    let result = QueryEngine::run(&plan, &tables).unwrap();
    assert_eq!(result.height(), 1);
    assert_eq!(string_column(&result, "name"), vec!["Delta State"]);
}

#[test]
fn test_inner_join_yields_only_matching_names() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());
    let tables = cleaned_tables(&config);

    let plan = QueryPlan {
        name: "joined".to_string(),
        from: "tuition_cost".to_string(),
        joins: vec![Join::on("salary_potential", &[("name", "name")])],
        order_by: vec![SortKey::asc("name")],
        ..QueryPlan::default()
    };
    let result = QueryEngine::run(&plan, &tables).unwrap();
    // Gamma Tech and Delta State have no salary row
    assert_eq!(
        string_column(&result, "name"),
        vec!["Acme College", "Beta U", "Zero U"]
    );
}

#[test]
fn test_zero_tuition_ratio_propagates_null() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());
    let tables = cleaned_tables(&config);

    let plan = QueryPlan {
        name: "unfiltered_ratio".to_string(),
        from: "tuition_cost".to_string(),
        joins: vec![Join::on("salary_potential", &[("name", "name")])],
        derives: vec![Derivation::new(
            "ratio",
            DeriveExpr::div(
                DeriveExpr::col("early_career_pay"),
                DeriveExpr::col("in_state_total"),
            ),
        )],
        order_by: vec![SortKey::asc("name")],
        ..QueryPlan::default()
    };
    let result = QueryEngine::run(&plan, &tables).unwrap();
    let ratio = result.column("ratio").unwrap().f64().unwrap();

    // Zero U has in_state_total = 0: null, not an error or infinity
    let names = string_column(&result, "name");
    let zero_idx = names.iter().position(|n| n == "Zero U").unwrap();
    assert!(ratio.get(zero_idx).is_none());
    // the other rows have finite ratios
    assert!(ratio.get(0).unwrap().is_finite());
}

#[test]
fn test_having_excludes_small_states() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());
    let tables = cleaned_tables(&config);

    let plan = QueryPlan {
        name: "big_states".to_string(),
        from: "tuition_cost".to_string(),
        group_by: vec!["state".to_string()],
        aggregates: vec![Aggregate::count("schools")],
        having: vec![Predicate::cmp("schools", CmpOp::Ge, 3.0)],
        ..QueryPlan::default()
    };
    let result = QueryEngine::run(&plan, &tables).unwrap();
    // only Ohio has 3 schools after dedup; Iowa and Texas have 1 each
    assert_eq!(string_column(&result, "state"), vec!["Ohio"]);
}

#[test]
fn test_order_limit_stability_on_ties() {
    let pay = df!(
        "school" => ["first", "second", "third", "fourth"],
        "pay" => [50000i64, 70000, 70000, 30000],
    )
    .unwrap();
    let tables = HashMap::from([("salary".to_string(), pay)]);

    let plan = QueryPlan {
        name: "top2".to_string(),
        from: "salary".to_string(),
        order_by: vec![SortKey::desc("pay")],
        limit: Some(2),
        ..QueryPlan::default()
    };
    let result = QueryEngine::run(&plan, &tables).unwrap();
    assert_eq!(string_column(&result, "school"), vec!["second", "third"]);
}

// ============================================================================
// Artifacts and Reproducibility
// ============================================================================

#[test]
fn test_battery_artifacts_exist() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());

    for name in [
        "avg_cost_by_state",
        "public_vs_private_cost",
        "out_of_state_premium",
        "top_early_career_pay",
        "stem_pay_by_state",
        "pay_to_cost_ratio",
        "hidden_gems",
        "enrollment_share_by_category",
        "net_cost_by_income",
        "historical_cost_by_type",
    ] {
        let path = config.output_dir.join(format!("{name}.csv"));
        assert!(path.exists(), "missing artifact {name}.csv");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.lines().count() >= 1, "{name} lost its header");
    }
}

#[test]
fn test_rerun_reproduces_identical_bytes() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());

    let artifact = config.output_dir.join("avg_cost_by_state.csv");
    let first = std::fs::read(&artifact).unwrap();

    // second run reuses the cleaned store and overwrites results
    Pipeline::new(config.clone()).run().unwrap();
    let second = std::fs::read(&artifact).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_hidden_gems_thresholds() {
    let root = tempfile::tempdir().unwrap();
    let config = run_pipeline(root.path());

    let content = std::fs::read_to_string(config.output_dir.join("hidden_gems.csv")).unwrap();
    // Acme College: 19000 total, 95000 mid-career -> exceptional tier
    assert!(content.contains("Acme College"));
    assert!(content.contains("exceptional"));
    // Beta U costs 30000, above the cost threshold
    assert!(!content.contains("Beta U"));
}
