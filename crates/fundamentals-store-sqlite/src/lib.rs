// crates/fundamentals-store-sqlite/src/lib.rs
// ============================================================================
// Module: Fundamentals SQLite Store
// Description: SQLite-backed RelationStore for the fundamentals ledger.
// Purpose: Persist date-keyed metric relations in a single `.db` file.
// Dependencies: fundamentals-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteStore`], the durable backend for the upsert
//! engine, plus [`Relation`] handles for direct table access.
//! Invariants:
//! - Store files always end with `.db`.
//! - Whole-table replaces are all-or-nothing.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::Relation;
pub use store::STORE_EXTENSION;
pub use store::SqliteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
