// crates/fundamentals-core/src/core/mod.rs
// ============================================================================
// Module: Fundamentals Core Types
// Description: Column declarations, snapshots, and observation dates.
// Purpose: Provide stable, serializable types shared by storage and the engine.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types define how relations are declared ([`ColumnSpec`]), how their
//! contents travel in memory ([`Snapshot`]), and how observations are keyed
//! ([`ObservationDate`]).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod schema;
pub mod snapshot;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use schema::ColumnSpec;
pub use schema::MAX_IDENTIFIER_LENGTH;
pub use schema::ScalarType;
pub use schema::SchemaError;
pub use schema::quote_identifier;
pub use schema::validate_identifier;
pub use snapshot::Scalar;
pub use snapshot::Snapshot;
pub use snapshot::SnapshotColumn;
pub use snapshot::SnapshotError;
pub use self::time::DateSource;
pub use self::time::FixedDate;
pub use self::time::InvalidDate;
pub use self::time::LocalClock;
pub use self::time::ObservationDate;
