// crates/fundamentals-core/tests/proptest_upsert.rs
// ============================================================================
// Module: Upsert Property Tests
// Description: Property-based checks for reconciliation invariants.
// ============================================================================
//! ## Overview
//! Random observation sequences must never lose columns, must keep one row per
//! distinct date, and must be idempotent when replayed.

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

use std::collections::BTreeSet;

use fundamentals_core::ColumnSpec;
use fundamentals_core::InMemoryRelationStore;
use fundamentals_core::RelationStore;
use fundamentals_core::Scalar;
use fundamentals_core::ScalarType;
use fundamentals_core::Snapshot;
use fundamentals_core::UpsertEngine;
use proptest::prelude::*;

const DATES: [&str; 4] = ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"];
const COLUMNS: [&str; 4] = ["PE", "EPS", "PEG", "PriceToBook"];

fn observation(date: usize, column: usize, value: i32) -> Snapshot {
    Snapshot::single_row([
        (ColumnSpec::new("Date", ScalarType::Text), Scalar::from(DATES[date])),
        (ColumnSpec::new(COLUMNS[column], ScalarType::Real), Scalar::Real(f64::from(value))),
    ])
    .unwrap()
}

fn step() -> impl Strategy<Value = (usize, usize, i32)> {
    (0 .. DATES.len(), 0 .. COLUMNS.len(), -1000 .. 1000)
}

proptest! {
    #[test]
    fn one_row_per_distinct_date(steps in prop::collection::vec(step(), 1 .. 24)) {
        let engine = UpsertEngine::new(InMemoryRelationStore::new());
        let mut dates = BTreeSet::new();
        for &(date, column, value) in &steps {
            engine.upsert("Fundamentals", &observation(date, column, value)).unwrap();
            dates.insert(date);
        }
        let table = engine.store().read_relation("Fundamentals").unwrap();
        prop_assert_eq!(table.row_count(), dates.len());
    }

    #[test]
    fn columns_only_grow(steps in prop::collection::vec(step(), 1 .. 24)) {
        let engine = UpsertEngine::new(InMemoryRelationStore::new());
        let mut previous: Vec<String> = Vec::new();
        for &(date, column, value) in &steps {
            engine.upsert("Fundamentals", &observation(date, column, value)).unwrap();
            let table = engine.store().read_relation("Fundamentals").unwrap();
            let names: Vec<String> = table.column_names().map(str::to_string).collect();
            prop_assert!(names.starts_with(&previous));
            previous = names;
        }
    }

    #[test]
    fn last_write_wins_per_cell(steps in prop::collection::vec(step(), 1 .. 24)) {
        let engine = UpsertEngine::new(InMemoryRelationStore::new());
        for &(date, column, value) in &steps {
            engine.upsert("Fundamentals", &observation(date, column, value)).unwrap();
        }
        let table = engine.store().read_relation("Fundamentals").unwrap();
        let &(date, column, value) = steps.last().unwrap();
        let row = (0 .. table.row_count())
            .find(|&row| table.value("Date", row) == Some(&Scalar::from(DATES[date])))
            .unwrap();
        prop_assert_eq!(table.value(COLUMNS[column], row), Some(&Scalar::Real(f64::from(value))));
    }

    #[test]
    fn replaying_an_observation_is_idempotent(
        steps in prop::collection::vec(step(), 1 .. 12),
        last in step(),
    ) {
        let engine = UpsertEngine::new(InMemoryRelationStore::new());
        for &(date, column, value) in &steps {
            engine.upsert("Fundamentals", &observation(date, column, value)).unwrap();
        }
        let (date, column, value) = last;
        engine.upsert("Fundamentals", &observation(date, column, value)).unwrap();
        let once = engine.store().read_relation("Fundamentals").unwrap();
        engine.upsert("Fundamentals", &observation(date, column, value)).unwrap();
        let twice = engine.store().read_relation("Fundamentals").unwrap();
        prop_assert_eq!(once, twice);
    }
}
