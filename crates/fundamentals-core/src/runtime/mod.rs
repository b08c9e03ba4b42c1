// crates/fundamentals-core/src/runtime/mod.rs
// ============================================================================
// Module: Fundamentals Runtime
// Description: Upsert engine and in-memory relation store.
// Purpose: Reconcile observations against any RelationStore backend.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the date-keyed upsert engine and a reference
//! in-memory store. Storage backends plug in through
//! [`crate::interfaces::RelationStore`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod store;
pub mod upsert;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::InMemoryRelationStore;
pub use upsert::DEFAULT_KEY_COLUMN;
pub use upsert::DuplicateKeyPolicy;
pub use upsert::Reconciled;
pub use upsert::UpsertConfig;
pub use upsert::UpsertEngine;
pub use upsert::UpsertError;
pub use upsert::UpsertOutcome;
pub use upsert::UpsertReport;
pub use upsert::observation_key;
pub use upsert::reconcile;
