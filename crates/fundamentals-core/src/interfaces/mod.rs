// crates/fundamentals-core/src/interfaces/mod.rs
// ============================================================================
// Module: Fundamentals Interfaces
// Description: Storage seam consumed by the upsert engine.
// Purpose: Keep reconciliation independent of any particular storage engine.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The upsert engine reaches storage only through [`RelationStore`]. A
//! backend must offer catalog lookups, relation creation, a full read, and a
//! whole-table replace; no per-row update capability is assumed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ColumnSpec;
use crate::core::SchemaError;
use crate::core::Snapshot;
use crate::core::SnapshotError;

// ============================================================================
// SECTION: Relation Store
// ============================================================================

/// Relation store errors.
///
/// # Invariants
/// - Messages never embed cell values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store, relation, or file already present.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Store, relation, or file absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// Store path lacks the required extension or violates path limits.
    #[error("invalid store path: {0}")]
    InvalidPath(String),
    /// Lock could not be acquired within the busy window.
    #[error("store lock timeout: {0}")]
    LockTimeout(String),
    /// Column type has no storage mapping.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Request is malformed.
    #[error("invalid store request: {0}")]
    Invalid(String),
    /// Filesystem I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Backend reported an error.
    #[error("store error: {0}")]
    Store(String),
}

impl From<SchemaError> for StoreError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::UnsupportedType(message) => Self::SchemaMismatch(message),
            SchemaError::InvalidIdentifier(message) => Self::Invalid(message),
        }
    }
}

impl From<SnapshotError> for StoreError {
    fn from(error: SnapshotError) -> Self {
        Self::Invalid(error.to_string())
    }
}

/// Named-relation storage with whole-table replace semantics.
pub trait RelationStore {
    /// Returns true when a relation with this name exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the catalog cannot be queried.
    fn relation_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Creates a relation with the given columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when the name is taken.
    fn create_relation(&self, name: &str, columns: &[ColumnSpec]) -> Result<(), StoreError>;

    /// Reads every row and column of a relation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the relation is absent.
    fn read_relation(&self, name: &str) -> Result<Snapshot, StoreError>;

    /// Replaces the relation's entire contents with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the replace fails; the previous contents
    /// must then remain intact.
    fn replace_relation(&self, name: &str, snapshot: &Snapshot) -> Result<(), StoreError>;
}

impl<T: RelationStore + ?Sized> RelationStore for &T {
    fn relation_exists(&self, name: &str) -> Result<bool, StoreError> {
        (**self).relation_exists(name)
    }

    fn create_relation(&self, name: &str, columns: &[ColumnSpec]) -> Result<(), StoreError> {
        (**self).create_relation(name, columns)
    }

    fn read_relation(&self, name: &str) -> Result<Snapshot, StoreError> {
        (**self).read_relation(name)
    }

    fn replace_relation(&self, name: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).replace_relation(name, snapshot)
    }
}
