// crates/fundamentals-store-sqlite/tests/sqlite_ledger.rs
// ============================================================================
// Module: SQLite Ledger Tests
// Description: Upsert engine and tracked metrics over a real SQLite file.
// ============================================================================
//! ## Overview
//! End-to-end checks that date-keyed upserts persist across reopen.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use fundamentals_core::ColumnSpec;
use fundamentals_core::FixedDate;
use fundamentals_core::Ledger;
use fundamentals_core::ObservationDate;
use fundamentals_core::RelationStore;
use fundamentals_core::Scalar;
use fundamentals_core::ScalarType;
use fundamentals_core::Snapshot;
use fundamentals_core::TrackedMetric;
use fundamentals_core::UpsertEngine;
use fundamentals_core::UpsertOutcome;
use fundamentals_core::metrics::EarningsPerShare;
use fundamentals_core::metrics::PriceToEarnings;
use fundamentals_store_sqlite::SqliteStore;
use fundamentals_store_sqlite::SqliteStoreConfig;
use tempfile::TempDir;

fn observation(date: &str, column: &str, value: f64) -> Snapshot {
    Snapshot::single_row([
        (ColumnSpec::new("Date", ScalarType::Text), Scalar::from(date)),
        (ColumnSpec::new(column, ScalarType::Real), Scalar::from(value)),
    ])
    .unwrap()
}

#[test]
fn upsert_cases_persist_across_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.db");
    {
        let store = SqliteStore::open(SqliteStoreConfig::new(&path)).unwrap();
        let engine = UpsertEngine::new(&store);
        let first = engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();
        assert_eq!(first.outcome, UpsertOutcome::Appended);
        let second = engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 12.0)).unwrap();
        assert_eq!(second.outcome, UpsertOutcome::Overwritten);
        let third = engine.upsert("Fundamentals", &observation("2024-01-01", "EPS", 3.0)).unwrap();
        assert_eq!(third.outcome, UpsertOutcome::Merged);
        let fourth = engine.upsert("Fundamentals", &observation("2024-01-02", "PE", 9.0)).unwrap();
        assert_eq!(fourth.outcome, UpsertOutcome::Appended);
    }

    let store = SqliteStore::open(SqliteStoreConfig::new(&path)).unwrap();
    let table = store.read_relation("Fundamentals").unwrap();
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Date", "PE", "EPS"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(12.0)));
    assert_eq!(table.value("EPS", 0), Some(&Scalar::Real(3.0)));
    assert_eq!(table.value("PE", 1), Some(&Scalar::Real(9.0)));
    assert_eq!(table.value("EPS", 1), Some(&Scalar::Null));
}

#[test]
fn identifiers_differing_in_case_update_existing_storage() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::open(SqliteStoreConfig::new(temp.path().join("ledger.db"))).unwrap();
    let engine = UpsertEngine::new(&store);
    engine.upsert("Fundamentals", &observation("2024-01-01", "PE", 10.0)).unwrap();

    let report = engine.upsert("fundamentals", &observation("2024-01-01", "pe", 12.0)).unwrap();
    assert!(!report.created_relation);
    assert_eq!(report.outcome, UpsertOutcome::Overwritten);
    assert!(report.columns_added.is_empty());

    assert_eq!(store.relation_names().unwrap(), vec!["Fundamentals".to_string()]);
    let table = store.read_relation("Fundamentals").unwrap();
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Date", "PE"]);
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.value("PE", 0), Some(&Scalar::Real(12.0)));
}

#[test]
fn tracked_metrics_share_the_daily_row() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::open(SqliteStoreConfig::new(temp.path().join("ledger.db"))).unwrap();
    let ledger = Ledger::new(UpsertEngine::new(&store as &dyn RelationStore))
        .with_date_source(FixedDate(ObservationDate::parse("2024-06-30").unwrap()));

    TrackedMetric::new(
        PriceToEarnings {
            forward_pe: Some(18.0),
            trailing_pe: Some(24.0),
        },
        Some(&ledger),
    )
    .unwrap();
    TrackedMetric::new(
        EarningsPerShare {
            forward_eps: Some(5.5),
            trailing_eps: None,
        },
        Some(&ledger),
    )
    .unwrap();

    let history = ledger.history().unwrap();
    assert_eq!(history.row_count(), 1);
    assert_eq!(
        history.column_names().collect::<Vec<_>>(),
        vec!["Date", "TrailingPE", "ForwardPE", "ForwardEPS", "TrailingEPS"]
    );
    assert_eq!(history.value("Date", 0), Some(&Scalar::from("2024-06-30")));
    assert_eq!(history.value("ForwardEPS", 0), Some(&Scalar::Real(5.5)));
    assert_eq!(history.value("TrailingEPS", 0), Some(&Scalar::Null));
}
