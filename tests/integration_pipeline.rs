//! Integration tests for the full validation loop
//!
//! These tests load the fixture files in `testdata/`, run the standard
//! hotel bookings pipeline and verify the cleaned tables end to end.

use polars::prelude::*;
use scour::config::PipelineConfig;
use scour::error::ScourError;
use scour::io::{load_table, save_table};
use scour::quality::{AlwaysDrop, DUPLICATES, NeverDrop, Pipeline, RuleReport};
use scour::schema::Schema;
use std::path::{Path, PathBuf};

const DIRTY: &str = "testdata/hotel_bookings_dirty.csv";

fn load_fixture(path: &str) -> DataFrame {
    let config = PipelineConfig::hotel_bookings();
    load_table(Path::new(path), &config.null_values).expect("fixture should load")
}

fn hotel_pipeline(review: &Path, drop_duplicates: bool) -> Pipeline {
    let config = PipelineConfig::hotel_bookings();
    if drop_duplicates {
        Pipeline::standard(Schema::hotel_bookings(), &config, review, Box::new(AlwaysDrop))
    } else {
        Pipeline::standard(Schema::hotel_bookings(), &config, review, Box::new(NeverDrop))
    }
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .expect("column exists")
        .as_materialized_series()
        .cast(&DataType::String)
        .expect("castable to string")
        .str()
        .expect("string column")
        .into_iter()
        .map(|v| v.map(ToOwned::to_owned))
        .collect()
}

#[test]
fn test_dirty_fixture_converges() {
    let dir = tempfile::tempdir().expect("tempdir");
    let review = dir.path().join("hotel_bookings_duplicates.csv");
    let pipeline = hotel_pipeline(&review, true);

    let df = load_fixture(DIRTY);
    assert_eq!(df.height(), 10, "Fixture should have 10 rows");
    assert_eq!(df.width(), 32, "Fixture should have 32 columns");

    let (clean, report) = pipeline.run(df).expect("pipeline should converge");

    assert_eq!(clean.height(), 6, "Rows 7, 8, 9 and one duplicate are removed");
    assert_eq!(clean.width(), 32, "Column set is preserved");
    assert!(
        pipeline
            .check(&clean)
            .expect("rules evaluate")
            .iter()
            .all(RuleReport::is_clean),
        "Every rule passes on the output"
    );

    let rules: Vec<&str> = report.repairs.iter().map(|r| r.rule.as_str()).collect();
    assert_eq!(rules, vec!["missing_values", "datatypes", "duplicates", "domain"]);
    assert_eq!(report.rows_before, 10);
    assert_eq!(report.rows_after, 6);
    assert!(report.waived.is_empty());
    assert!(report.review_file.is_none());
    assert!(!review.exists(), "Review file is deleted once duplicates are dropped");
}

#[test]
fn test_dirty_fixture_repairs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = hotel_pipeline(&dir.path().join("dupes.csv"), true);
    let (clean, _) = pipeline.run(load_fixture(DIRTY)).expect("pipeline should converge");

    // sentinel fill
    let agent: Vec<Option<i64>> = clean
        .column("agent")
        .and_then(|c| c.i64().cloned())
        .expect("agent is Int64")
        .into_iter()
        .collect();
    assert_eq!(
        agent,
        vec![Some(-99), Some(-99), Some(304), Some(240), Some(9), Some(1)]
    );
    assert!(
        strings(&clean, "company")
            .iter()
            .all(|v| v.as_deref() == Some("-99"))
    );

    // alias and clamp
    let countries = strings(&clean, "country");
    assert_eq!(countries.get(4).cloned().flatten().as_deref(), Some("CHN"));
    assert!(!countries.iter().any(|c| c.as_deref() == Some("CN")));
    let adr = clean
        .column("adr")
        .and_then(|c| c.f64().cloned())
        .expect("adr is Float64");
    assert_eq!(adr.get(4), Some(0.0));

    // coercions
    assert_eq!(clean.column("lead_time").map(|c| c.dtype().clone()).ok(), Some(DataType::Float64));
    assert_eq!(
        clean.column("reservation_status_date").map(|c| c.dtype().clone()).ok(),
        Some(DataType::Date)
    );
    assert_eq!(
        strings(&clean, "reservation_status_date").last().cloned().flatten().as_deref(),
        Some("2016-12-08")
    );
}

#[test]
fn test_cleaned_output_is_stable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = hotel_pipeline(&dir.path().join("dupes.csv"), true);
    let (mut clean, _) = pipeline.run(load_fixture(DIRTY)).expect("pipeline should converge");

    let (again, report) = pipeline.run(clean.clone()).expect("clean table passes");
    assert!(again.equals_missing(&clean), "Clean table is returned unchanged");
    assert!(report.repairs.is_empty());
    assert_eq!(report.iterations, 1);

    let output: PathBuf = dir.path().join("hotel_bookings_cleaned.csv");
    save_table(&mut clean, &output).expect("output is written");
    let reloaded = load_table(&output, &PipelineConfig::hotel_bookings().null_values)
        .expect("output reloads");
    let (reloaded_clean, report) = pipeline.run(reloaded).expect("reloaded output converges");
    assert_eq!(report.rows_removed(), 0, "No row of the output is rejected");
    assert!(reloaded_clean.equals_missing(&clean));
}

#[test]
fn test_declined_duplicates_keep_review_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let review = dir.path().join("hotel_bookings_duplicates.csv");
    let pipeline = hotel_pipeline(&review, false);

    let (table, report) = pipeline.run(load_fixture(DIRTY)).expect("pipeline should finish");
    assert_eq!(table.height(), 7, "Both copies of the duplicate survive");
    assert_eq!(report.waived, vec![DUPLICATES.to_owned()]);
    assert_eq!(report.review_file.as_deref(), Some(review.as_path()));

    let copies = load_table(&review, &[]).expect("review file is a CSV");
    assert_eq!(copies.height(), 2, "Every copy is written verbatim");
    assert_eq!(copies.width(), 32);
    let first = copies.slice(0, 1);
    let second = copies.slice(1, 1);
    assert!(first.equals_missing(&second));
}

#[test]
fn test_bad_header_is_schema_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = hotel_pipeline(&dir.path().join("dupes.csv"), true);

    let err = pipeline
        .run(load_fixture("testdata/bad_header.csv"))
        .expect_err("whitespace in a column name is fatal");
    let ScourError::Schema { rule, message } = err else {
        panic!("expected a schema error, got {err}");
    };
    assert_eq!(rule, "column_names");
    assert!(message.contains("arrival date year"), "{message}");
}

#[test]
fn test_custom_schema_rejects_non_coercible_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("guests.csv");
    std::fs::write(&input, "guest,adults\nana,2\nben,3.0\ncai,two\n").expect("write input");

    let schema = Schema::from_json(
        r#"{"columns": [
            {"name": "guest", "kind": "text"},
            {"name": "adults", "kind": "integer", "domain": {"rule": "range", "min": 0}}
        ]}"#,
    )
    .expect("valid schema");
    let config = PipelineConfig::default();
    let pipeline = Pipeline::standard(schema, &config, dir.path().join("dupes.csv"), Box::new(AlwaysDrop));

    let df = load_table(&input, &config.null_values).expect("input loads");
    let err = pipeline.run(df).expect_err("'two' cannot become an integer");
    assert!(matches!(err, ScourError::Schema { ref rule, .. } if rule == "datatypes"));
    assert!(err.to_string().contains("'two'"));
}

#[test]
fn test_nan_rates_are_dropped_as_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("rates.csv");
    std::fs::write(&input, "adr\n75.0\nNaN\n-5.0\n").expect("write input");

    let schema = Schema::from_json(
        r#"{"columns": [
            {"name": "adr", "kind": "float", "domain": {"rule": "range", "min": 0}}
        ]}"#,
    )
    .expect("valid schema");
    let config = PipelineConfig::default();
    let pipeline = Pipeline::standard(schema, &config, dir.path().join("dupes.csv"), Box::new(AlwaysDrop));

    let df = load_table(&input, &config.null_values).expect("input loads");
    let (clean, report) = pipeline.run(df).expect("pipeline should converge");

    let adr: Vec<Option<f64>> = clean
        .column("adr")
        .and_then(|c| c.f64().cloned())
        .expect("adr is Float64")
        .into_iter()
        .collect();
    assert_eq!(adr, vec![Some(75.0)]);
    assert_eq!(report.rows_removed(), 2);
}

#[test]
fn test_rows_differing_only_in_control_characters_survive() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = Schema::from_json(
        r#"{"columns": [
            {"name": "a", "kind": "text"},
            {"name": "b", "kind": "text"}
        ]}"#,
    )
    .expect("valid schema");
    let review = dir.path().join("dupes.csv");
    let pipeline = Pipeline::standard(schema, &PipelineConfig::default(), &review, Box::new(AlwaysDrop));

    let df = df!(
        "a" => ["x\u{1f}", "x", "\u{0}"],
        "b" => ["y", "\u{1f}y", "y"],
    )
    .expect("valid frame");
    let (clean, report) = pipeline.run(df.clone()).expect("pipeline should converge");

    assert!(clean.equals_missing(&df), "Distinct rows are never merged");
    assert!(report.repairs.is_empty());
    assert!(!review.exists());
}
