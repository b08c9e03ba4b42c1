// crates/fundamentals-core/tests/upsert_engine.rs
// ============================================================================
// Module: Upsert Engine Tests
// Description: Date-keyed append, overwrite, and merge behavior.
// ============================================================================
//! ## Overview
//! Exercises the upsert engine against the in-memory relation store.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use fundamentals_core::ColumnSpec;
use fundamentals_core::DuplicateKeyPolicy;
use fundamentals_core::InMemoryRelationStore;
use fundamentals_core::MemoryAuditSink;
use fundamentals_core::RelationStore;
use fundamentals_core::Scalar;
use fundamentals_core::ScalarType;
use fundamentals_core::Snapshot;
use fundamentals_core::SnapshotColumn;
use fundamentals_core::StoreError;
use fundamentals_core::UpsertConfig;
use fundamentals_core::UpsertEngine;
use fundamentals_core::UpsertError;
use fundamentals_core::UpsertOutcome;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn observation(date: &str, column: &str, value: f64) -> Snapshot {
    Snapshot::single_row([
        (ColumnSpec::new("Date", ScalarType::Text), Scalar::from(date)),
        (ColumnSpec::new(column, ScalarType::Real), Scalar::from(value)),
    ])
    .unwrap()
}

fn engine() -> UpsertEngine<InMemoryRelationStore> {
    UpsertEngine::new(InMemoryRelationStore::new())
}

// ============================================================================
// SECTION: Cases
// ============================================================================

#[test]
fn upsert_into_missing_relation_creates_one_row() {
    let engine = engine();
    let report = engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    assert!(report.created_relation);
    assert_eq!(report.outcome, UpsertOutcome::Appended);

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Date", "PE"]);
    assert_eq!(table.row(0).unwrap(), vec![&Scalar::from("2024-01-01"), &Scalar::Real(10.0)]);
}

#[test]
fn same_date_same_columns_overwrites_in_place() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    let report = engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 12.0)).unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Overwritten);
    assert!(!report.created_relation);

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(12.0)));
}

#[test]
fn same_date_new_column_merges_on_key() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    let report = engine.upsert("Fundamentals", &observation("2024-01-01", "EPS", 3.0)).unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Merged);
    assert_eq!(report.columns_added, vec!["EPS".to_string()]);

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Date", "PE", "EPS"]);
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(10.0)));
    assert_eq!(table.value("EPS", 0), Some(&Scalar::Real(3.0)));
}

#[test]
fn new_date_appends_without_touching_history() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    let report = engine.upsert("Fundamentals", &observation("2024-01-02", "PE", 9.0)).unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Appended);
    assert_eq!(report.rows_before, 1);
    assert_eq!(report.rows_after, 2);

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(10.0)));
    assert_eq!(table.value("Date", 1), Some(&Scalar::from("2024-01-02")));
    assert_eq!(table.value("PE", 1), Some(&Scalar::Real(9.0)));
}

#[test]
fn appended_row_back_fills_columns_missing_from_observation() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    engine.upsert("Fundamentals", &observation("2024-01-01", "EPS", 3.0)).unwrap();
    engine.upsert("Fundamentals", &observation("2024-01-02", "EPS", 4.0)).unwrap();

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.value("PE", 1), Some(&Scalar::Null));
    assert_eq!(table.value("EPS", 1), Some(&Scalar::Real(4.0)));
}

#[test]
fn new_date_with_new_column_back_fills_history() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    engine.upsert("Fundamentals", &observation("2024-01-02", "EPS", 2.5)).unwrap();

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.column_count(), 3);
    assert_eq!(table.value("EPS", 0), Some(&Scalar::Null));
    assert_eq!(table.value("PE", 1), Some(&Scalar::Null));
}

#[test]
fn null_observation_values_are_written() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    let blank = Snapshot::single_row([
        (ColumnSpec::new("Date", ScalarType::Text), Scalar::from("2024-01-01")),
        (ColumnSpec::new("PE", ScalarType::Real), Scalar::Null),
    ])
    .unwrap();
    engine.upsert("Fundamentals", &blank).unwrap();

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.value("PE", 0), Some(&Scalar::Null));
}

#[test]
fn column_names_differing_in_case_update_the_existing_column() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    let report = engine.upsert("Fundamentals", &observation("2024-01-01", "pe", 12.0)).unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Overwritten);
    assert!(report.columns_added.is_empty());

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Date", "PE"]);
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(12.0)));
}

#[test]
fn relation_names_differing_in_case_share_one_relation() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    let report = engine.upsert("fundamentals", &observation("2024-01-02", "PE", 9.0)).unwrap();
    assert!(!report.created_relation);
    assert_eq!(report.outcome, UpsertOutcome::Appended);
    assert_eq!(engine.store().relation_names().unwrap(), vec!["Fundamentals".to_string()]);
    assert_eq!(engine.store().read_relation("FUNDAMENTALS").unwrap().row_count(), 2);
}

// ============================================================================
// SECTION: Duplicate Keys
// ============================================================================

fn seeded_with_duplicate_dates() -> InMemoryRelationStore {
    let store = InMemoryRelationStore::new();
    let table = Snapshot::from_columns(vec![
        SnapshotColumn::new(
            "Date",
            ScalarType::Text,
            vec![Scalar::from("2024-01-01"), Scalar::from("2024-01-01")],
        ),
        SnapshotColumn::new("PE", ScalarType::Real, vec![Scalar::Real(1.0), Scalar::Real(2.0)]),
    ])
    .unwrap();
    store.create_relation("Fundamentals", &table.column_specs()).unwrap();
    store.replace_relation("Fundamentals", &table).unwrap();
    store
}

#[test]
fn duplicate_keys_are_updated_together_by_default() {
    let engine = UpsertEngine::new(seeded_with_duplicate_dates());
    engine.upsert("Fundamentals", &observation("2024-01-01", "EPS", 3.0)).unwrap();

    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(1.0)));
    assert_eq!(table.value("PE", 1), Some(&Scalar::Real(2.0)));
    assert_eq!(table.value("EPS", 0), Some(&Scalar::Real(3.0)));
    assert_eq!(table.value("EPS", 1), Some(&Scalar::Real(3.0)));
}

#[test]
fn duplicate_keys_are_rejected_when_configured() {
    let config = UpsertConfig {
        duplicate_keys: DuplicateKeyPolicy::Reject,
        ..UpsertConfig::default()
    };
    let engine = UpsertEngine::with_config(seeded_with_duplicate_dates(), config);
    let err = engine.upsert("Fundamentals", &observation("2024-01-01", "EPS", 3.0)).unwrap_err();
    assert_eq!(
        err,
        UpsertError::DuplicateKey {
            key: "2024-01-01".to_string(),
            count: 2,
        }
    );
    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert!(!table.contains_column("EPS"));
}

// ============================================================================
// SECTION: Failures
// ============================================================================

#[test]
fn failed_replace_leaves_previous_contents() {
    let engine = engine();
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    engine.store().fail_replaces_with(Some(StoreError::LockTimeout("busy".to_string())));

    let err = engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 12.0)).unwrap_err();
    assert!(matches!(err, UpsertError::Store(StoreError::LockTimeout(_))));

    engine.store().fail_replaces_with(None);
    let table = engine.store().read_relation("Fundamentals").unwrap();
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(10.0)));
}

#[test]
fn observation_must_be_a_single_keyed_row() {
    let engine = engine();
    let keyless = Snapshot::single_row([(ColumnSpec::new("PE", ScalarType::Real), Scalar::Real(1.0))])
        .unwrap();
    assert!(matches!(
        engine.upsert("Fundamentals", &keyless),
        Err(UpsertError::InvalidObservation(_))
    ));
    assert!(matches!(
        engine.upsert("Fundamentals", &Snapshot::new()),
        Err(UpsertError::InvalidObservation(_))
    ));
    assert!(!engine.store().relation_exists("Fundamentals").unwrap());
}

#[test]
fn relation_without_key_column_is_rejected() {
    let store = InMemoryRelationStore::new();
    store.create_relation("Prices", &[ColumnSpec::new("Close", ScalarType::Real)]).unwrap();
    let engine = UpsertEngine::new(store);
    let err = engine.upsert("Prices", &observation("2024-01-01", "PE", 1.0)).unwrap_err();
    assert_eq!(
        err,
        UpsertError::MissingKeyColumn {
            key_column: "Date".to_string(),
        }
    );
}

#[test]
fn upserts_are_audited() {
    let audit = Arc::new(MemoryAuditSink::new());
    let engine = engine().with_audit(audit.clone());
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
    engine.upsert("Fundamentals", &observation("2024-01-01", "EPS", 3.0)).unwrap();

    let events = audit.upserts();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].outcome, UpsertOutcome::Appended);
    assert!(events[0].created_relation);
    assert_eq!(events[1].outcome, UpsertOutcome::Merged);
    assert_eq!(events[1].columns_added, vec!["EPS".to_string()]);
}
