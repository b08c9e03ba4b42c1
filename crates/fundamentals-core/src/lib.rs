// crates/fundamentals-core/src/lib.rs
// ============================================================================
// Module: Fundamentals Core
// Description: Relation contract, date-keyed upsert engine, and metrics.
// Purpose: Track daily fundamental metrics in a backend-agnostic ledger.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! This crate holds everything that does not depend on a storage engine:
//! column and snapshot types, the [`RelationStore`] contract, the upsert
//! engine that reconciles one observation per date into a relation, and the
//! ten fundamental metrics that produce those observations.
//! Invariants:
//! - At most one logical row exists per observation date unless the relation
//!   already held duplicates when the engine first saw it.
//! - Existing columns and rows are never dropped by an upsert.
//!
//! Storage backends implement [`RelationStore`]; the `SQLite` backend lives in
//! `fundamentals-store-sqlite`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod metrics;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::StoreAction;
pub use audit::StoreAuditEvent;
pub use audit::UpsertAuditEvent;
pub use core::*;
pub use interfaces::RelationStore;
pub use interfaces::StoreError;
pub use metrics::DEFAULT_LEDGER_RELATION;
pub use metrics::Ledger;
pub use metrics::Metric;
pub use metrics::MetricField;
pub use metrics::TrackedMetric;
pub use runtime::DEFAULT_KEY_COLUMN;
pub use runtime::DuplicateKeyPolicy;
pub use runtime::InMemoryRelationStore;
pub use runtime::UpsertConfig;
pub use runtime::UpsertEngine;
pub use runtime::UpsertError;
pub use runtime::UpsertOutcome;
pub use runtime::UpsertReport;
