// crates/fundamentals-core/tests/metrics_ledger.rs
// ============================================================================
// Module: Metric Ledger Tests
// Description: Metric formulas, display, and ledger persistence.
// ============================================================================
//! ## Overview
//! Verifies each metric's percent formula and that tracked metrics persist
//! their raw inputs under today's date.

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
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use fundamentals_core::FixedDate;
use fundamentals_core::InMemoryRelationStore;
use fundamentals_core::Ledger;
use fundamentals_core::Metric;
use fundamentals_core::ObservationDate;
use fundamentals_core::RelationStore;
use fundamentals_core::Scalar;
use fundamentals_core::TrackedMetric;
use fundamentals_core::UpsertEngine;
use fundamentals_core::UpsertOutcome;
use fundamentals_core::metrics::DebtToEquity;
use fundamentals_core::metrics::DividendPayout;
use fundamentals_core::metrics::DividendYield;
use fundamentals_core::metrics::EarningsPerShare;
use fundamentals_core::metrics::FreeCashflow;
use fundamentals_core::metrics::PriceToBook;
use fundamentals_core::metrics::PriceToEarnings;
use fundamentals_core::metrics::PriceToEarningsGrowth;
use fundamentals_core::metrics::PriceToSales;
use fundamentals_core::metrics::ReturnOnEquity;

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap();
    assert!((actual - expected).abs() < 1e-12, "{actual} != {expected}");
}

fn ledger_on<'s>(store: &'s InMemoryRelationStore, date: &str) -> Ledger<'s> {
    Ledger::new(UpsertEngine::new(store as &dyn RelationStore))
        .with_date_source(FixedDate(ObservationDate::parse(date).unwrap()))
}

// ============================================================================
// SECTION: Formulas
// ============================================================================

#[test]
fn formulas_match_definitions() {
    assert_close(
        PriceToEarnings {
            forward_pe: Some(15.0),
            trailing_pe: Some(20.0),
        }
        .compute_percent(),
        0.25,
    );
    assert_close(
        PriceToEarningsGrowth {
            peg: Some(1.0),
            trailing_peg: Some(2.0),
        }
        .compute_percent(),
        0.5,
    );
    assert_close(
        EarningsPerShare {
            forward_eps: Some(6.0),
            trailing_eps: Some(5.0),
        }
        .compute_percent(),
        -0.2,
    );
    assert_close(
        FreeCashflow {
            free_cashflow: Some(10.0),
            market_cap: Some(100.0),
        }
        .compute_percent(),
        0.9,
    );
    assert_close(PriceToBook { pb: Some(0.5) }.compute_percent(), 1.0);
    assert_close(ReturnOnEquity { roe: Some(2.5) }.compute_percent(), 0.75);
    assert_close(DividendPayout { dp: Some(4.0) }.compute_percent(), 0.25);
    assert_close(PriceToSales { ps: Some(3.2) }.compute_percent(), 3.2);
    assert_close(DividendYield { dy: Some(1.0) }.compute_percent(), 0.5);
    assert_close(DebtToEquity { de: Some(3.0) }.compute_percent(), 0.25);
}

#[test]
fn every_metric_propagates_missing_inputs() {
    assert_eq!(PriceToEarnings::default().compute_percent(), None);
    assert_eq!(PriceToEarningsGrowth::default().compute_percent(), None);
    assert_eq!(EarningsPerShare::default().compute_percent(), None);
    assert_eq!(FreeCashflow::default().compute_percent(), None);
    assert_eq!(PriceToBook::default().compute_percent(), None);
    assert_eq!(ReturnOnEquity::default().compute_percent(), None);
    assert_eq!(DividendPayout::default().compute_percent(), None);
    assert_eq!(PriceToSales::default().compute_percent(), None);
    assert_eq!(DividendYield::default().compute_percent(), None);
    assert_eq!(DebtToEquity::default().compute_percent(), None);
}

#[test]
fn display_rounds_to_two_places() {
    let tracked = TrackedMetric::detached(PriceToEarnings {
        forward_pe: Some(10.0),
        trailing_pe: Some(12.0),
    });
    assert_eq!(tracked.to_string(), "Price to Earnings Ratio: 16.67%");

    let missing = TrackedMetric::detached(DividendYield::default());
    assert_eq!(missing.to_string(), "Dividend Yield: 0%");
}

#[test]
fn debt_to_equity_has_its_own_name() {
    assert_eq!(DebtToEquity::default().name(), "Debt to Equity");
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

#[test]
fn tracked_metric_persists_inputs_under_today() {
    let store = InMemoryRelationStore::new();
    let ledger = ledger_on(&store, "2024-03-15");
    let tracked = TrackedMetric::new(
        PriceToEarnings {
            forward_pe: Some(15.0),
            trailing_pe: Some(20.0),
        },
        Some(&ledger),
    )
    .unwrap();
    assert_close(tracked.percent(), 0.25);
    assert_eq!(tracked.last_report().unwrap().outcome, UpsertOutcome::Appended);

    let table = store.read_relation("Fundamentals").unwrap();
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Date", "TrailingPE", "ForwardPE"]);
    assert_eq!(table.value("Date", 0), Some(&Scalar::from("2024-03-15")));
    assert_eq!(table.value("TrailingPE", 0), Some(&Scalar::Real(20.0)));
}

#[test]
fn metrics_share_one_row_per_day() {
    let store = InMemoryRelationStore::new();
    let ledger = ledger_on(&store, "2024-03-15");
    TrackedMetric::new(PriceToBook { pb: Some(2.0) }, Some(&ledger)).unwrap();
    let second = TrackedMetric::new(DividendYield { dy: Some(0.02) }, Some(&ledger)).unwrap();
    assert_eq!(second.last_report().unwrap().outcome, UpsertOutcome::Merged);

    let history = ledger.history().unwrap();
    assert_eq!(history.row_count(), 1);
    assert_eq!(history.value("PriceToBook", 0), Some(&Scalar::Real(2.0)));
    assert_eq!(history.value("DividendYield", 0), Some(&Scalar::Real(0.02)));
}

#[test]
fn missing_inputs_are_persisted_as_nulls() {
    let store = InMemoryRelationStore::new();
    let ledger = ledger_on(&store, "2024-03-15");
    let tracked = TrackedMetric::new(ReturnOnEquity::default(), Some(&ledger)).unwrap();
    assert_eq!(tracked.percent(), None);
    let history = ledger.history().unwrap();
    assert_eq!(history.value("ReturnOnEquity", 0), Some(&Scalar::Null));
}

#[test]
fn update_inputs_recomputes_and_overwrites() {
    let store = InMemoryRelationStore::new();
    let ledger = ledger_on(&store, "2024-03-15");
    let mut tracked = TrackedMetric::new(DividendPayout { dp: Some(2.0) }, Some(&ledger)).unwrap();
    let report = tracked.update_inputs(|metric| metric.dp = Some(4.0)).unwrap().cloned().unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Overwritten);
    assert_close(tracked.percent(), 0.25);

    let history = ledger.history().unwrap();
    assert_eq!(history.row_count(), 1);
    assert_eq!(history.value("DividendPayout", 0), Some(&Scalar::Real(4.0)));
}

#[test]
fn custom_relation_name_is_used() {
    let store = InMemoryRelationStore::new();
    let ledger = ledger_on(&store, "2024-03-15").with_relation("Acme");
    TrackedMetric::new(PriceToSales { ps: Some(1.5) }, Some(&ledger)).unwrap();
    assert!(store.relation_exists("Acme").unwrap());
    assert!(!store.relation_exists("Fundamentals").unwrap());
}

#[test]
fn detached_metric_never_touches_storage() {
    let store = InMemoryRelationStore::new();
    let tracked = TrackedMetric::new(PriceToSales { ps: Some(1.5) }, None).unwrap();
    assert_close(tracked.percent(), 1.5);
    assert!(tracked.last_report().is_none());
    assert!(store.relation_names().unwrap().is_empty());
}
