// crates/fundamentals-core/src/runtime/store.rs
// ============================================================================
// Module: Fundamentals In-Memory Store
// Description: Simple in-memory relation store for tests and examples.
// Purpose: Provide a deterministic RelationStore without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`RelationStore`] for tests and local demos. It is not intended for
//! production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::ColumnSpec;
use crate::core::Snapshot;
use crate::core::validate_identifier;
use crate::interfaces::RelationStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory relation store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRelationStore {
    /// Relation contents keyed by name as first created. Lookups ignore
    /// ASCII case.
    relations: Arc<Mutex<BTreeMap<String, Snapshot>>>,
    /// Error returned by every replace while set.
    replace_failure: Arc<Mutex<Option<StoreError>>>,
}

impl InMemoryRelationStore {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent replace fail with `error` (or succeed again
    /// when `None`).
    pub fn fail_replaces_with(&self, error: Option<StoreError>) {
        if let Ok(mut guard) = self.replace_failure.lock() {
            *guard = error;
        }
    }

    /// Returns relation names in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Store`] when the mutex is poisoned.
    pub fn relation_names(&self) -> Result<Vec<String>, StoreError> {
        let guard = self
            .relations
            .lock()
            .map_err(|_| StoreError::Store("relation store mutex poisoned".to_string()))?;
        Ok(guard.keys().cloned().collect())
    }

    /// Drops a relation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the relation is absent.
    pub fn drop_relation(&self, name: &str) -> Result<(), StoreError> {
        let mut guard = self
            .relations
            .lock()
            .map_err(|_| StoreError::Store("relation store mutex poisoned".to_string()))?;
        let key = stored_key(&guard, name)
            .ok_or_else(|| StoreError::NotFound(format!("relation {name}")))?;
        guard.remove(&key);
        drop(guard);
        Ok(())
    }
}

/// Returns the stored key matching `name`, ignoring ASCII case.
fn stored_key(relations: &BTreeMap<String, Snapshot>, name: &str) -> Option<String> {
    relations.keys().find(|key| key.eq_ignore_ascii_case(name)).cloned()
}

impl RelationStore for InMemoryRelationStore {
    fn relation_exists(&self, name: &str) -> Result<bool, StoreError> {
        let guard = self
            .relations
            .lock()
            .map_err(|_| StoreError::Store("relation store mutex poisoned".to_string()))?;
        Ok(stored_key(&guard, name).is_some())
    }

    fn create_relation(&self, name: &str, columns: &[ColumnSpec]) -> Result<(), StoreError> {
        validate_identifier(name)?;
        if columns.is_empty() {
            return Err(StoreError::Invalid(format!("relation {name} needs at least one column")));
        }
        for column in columns {
            validate_identifier(&column.name)?;
        }
        let snapshot = Snapshot::with_schema(columns)?;
        let mut guard = self
            .relations
            .lock()
            .map_err(|_| StoreError::Store("relation store mutex poisoned".to_string()))?;
        if stored_key(&guard, name).is_some() {
            return Err(StoreError::AlreadyExists(format!("relation {name}")));
        }
        guard.insert(name.to_string(), snapshot);
        drop(guard);
        Ok(())
    }

    fn read_relation(&self, name: &str) -> Result<Snapshot, StoreError> {
        let guard = self
            .relations
            .lock()
            .map_err(|_| StoreError::Store("relation store mutex poisoned".to_string()))?;
        stored_key(&guard, name)
            .and_then(|key| guard.get(&key).cloned())
            .ok_or_else(|| StoreError::NotFound(format!("relation {name}")))
    }

    fn replace_relation(&self, name: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        validate_identifier(name)?;
        if let Some(error) = self
            .replace_failure
            .lock()
            .map_err(|_| StoreError::Store("relation store mutex poisoned".to_string()))?
            .clone()
        {
            return Err(error);
        }
        let mut guard = self
            .relations
            .lock()
            .map_err(|_| StoreError::Store("relation store mutex poisoned".to_string()))?;
        let key = stored_key(&guard, name).unwrap_or_else(|| name.to_string());
        guard.insert(key, snapshot.clone());
        drop(guard);
        Ok(())
    }
}
