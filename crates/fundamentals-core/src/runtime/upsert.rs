// crates/fundamentals-core/src/runtime/upsert.rs
// ============================================================================
// Module: Fundamentals Upsert Engine
// Description: Date-keyed reconciliation of observations into relations.
// Purpose: Merge one observation row into a relation without losing history.
// Dependencies: crate::{audit, core, interfaces}, serde, thiserror
// ============================================================================

//! ## Overview
//! The upsert engine reconciles a one-row observation with the full contents
//! of a relation, keyed by the date column, and writes the merged table back
//! with a whole-table replace. Reconciliation happens in memory, so tables
//! are bounded by available memory; daily single-asset logs stay small.
//!
//! Three cases are distinguished:
//! - **Appended**: no row holds the key; the observation becomes a new row.
//! - **Overwritten**: rows hold the key and every observation column already
//!   exists; those columns are overwritten on every matching row.
//! - **Merged**: rows hold the key and the observation adds columns; the
//!   result is an outer join on the key with a column union.
//!
//! Missing cells are filled with [`Scalar::Null`]. Null observation values are
//! written like any other value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::UpsertAuditEvent;
use crate::core::Scalar;
use crate::core::SchemaError;
use crate::core::Snapshot;
use crate::core::SnapshotError;
use crate::core::validate_identifier;
use crate::interfaces::RelationStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default key column for observations.
pub const DEFAULT_KEY_COLUMN: &str = "Date";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Handling of rows that already share the observation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Apply the observation to every matching row.
    #[default]
    Preserve,
    /// Fail when more than one row already holds the key.
    Reject,
}

/// Upsert engine configuration.
///
/// # Invariants
/// - `key_column` names a text column holding ISO dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertConfig {
    /// Key column name.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    /// Duplicate key handling.
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl Default for UpsertConfig {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            duplicate_keys: DuplicateKeyPolicy::default(),
        }
    }
}

/// Returns the default key column name.
fn default_key_column() -> String {
    DEFAULT_KEY_COLUMN.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Upsert engine errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpsertError {
    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Identifier or type declaration failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Snapshot shape failure.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// Observation is not a single keyed row.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),
    /// Existing relation lacks the key column.
    #[error("relation is missing key column {key_column}")]
    MissingKeyColumn {
        /// Key column name.
        key_column: String,
    },
    /// Existing relation already holds several rows for the key.
    #[error("key {key} already appears in {count} rows")]
    DuplicateKey {
        /// Key value.
        key: String,
        /// Number of matching rows.
        count: usize,
    },
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// How an observation was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// New row appended.
    Appended,
    /// Matching rows overwritten in place.
    Overwritten,
    /// Matching rows joined with new columns.
    Merged,
}

/// Result of the in-memory reconciliation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Merged table to write back.
    pub snapshot: Snapshot,
    /// Case applied.
    pub outcome: UpsertOutcome,
    /// Rows the observation was applied to.
    pub affected_rows: Vec<usize>,
    /// Columns introduced by the observation.
    pub columns_added: Vec<String>,
}

/// Summary of a completed upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    /// Relation written.
    pub relation: String,
    /// Observation key.
    pub key: String,
    /// Case applied.
    pub outcome: UpsertOutcome,
    /// Whether the relation was created first.
    pub created_relation: bool,
    /// Rows before the upsert.
    pub rows_before: usize,
    /// Rows after the upsert.
    pub rows_after: usize,
    /// Columns introduced by the observation.
    pub columns_added: Vec<String>,
}

// ============================================================================
// SECTION: Reconciliation
// ============================================================================

/// Returns the key of a one-row observation.
///
/// # Errors
///
/// Returns [`UpsertError::InvalidObservation`] unless the observation has
/// exactly one row and a non-empty text key.
pub fn observation_key<'a>(
    observation: &'a Snapshot,
    key_column: &str,
) -> Result<&'a str, UpsertError> {
    if observation.row_count() != 1 {
        return Err(UpsertError::InvalidObservation(format!(
            "expected exactly one row, found {}",
            observation.row_count()
        )));
    }
    match observation.value(key_column, 0) {
        None => Err(UpsertError::InvalidObservation(format!("missing key column {key_column}"))),
        Some(Scalar::Text(key)) if !key.is_empty() => Ok(key.as_str()),
        Some(_) => Err(UpsertError::InvalidObservation(format!(
            "key column {key_column} must hold a non-empty date string"
        ))),
    }
}

/// Reconciles one observation row into an existing table.
///
/// Existing rows keep their storage order. Columns absent from the existing
/// table are appended and back-filled with nulls; existing columns that hold
/// only nulls adopt the observation's declared type.
///
/// # Errors
///
/// Returns [`UpsertError`] when the observation is malformed, the table lacks
/// the key column, or the duplicate key policy rejects the table.
pub fn reconcile(
    existing: Snapshot,
    observation: &Snapshot,
    key_column: &str,
    policy: DuplicateKeyPolicy,
) -> Result<Reconciled, UpsertError> {
    let key = observation_key(observation, key_column)?;
    let Some(key_values) = existing.column(key_column).map(|column| &column.values) else {
        return Err(UpsertError::MissingKeyColumn {
            key_column: key_column.to_string(),
        });
    };
    let matches: Vec<usize> = key_values
        .iter()
        .enumerate()
        .filter(|(_, value)| value.as_text() == Some(key))
        .map(|(row, _)| row)
        .collect();
    if policy == DuplicateKeyPolicy::Reject && matches.len() > 1 {
        return Err(UpsertError::DuplicateKey {
            key: key.to_string(),
            count: matches.len(),
        });
    }

    let mut merged = existing;
    let mut columns_added = Vec::new();
    for column in observation.columns() {
        match merged.column(&column.name) {
            None => {
                merged.push_null_column(&column.spec())?;
                columns_added.push(column.name.clone());
            }
            Some(current)
                if current.scalar_type != column.scalar_type
                    && current.values.iter().all(Scalar::is_null) =>
            {
                merged.set_column_type(&column.name, column.scalar_type)?;
            }
            Some(_) => {}
        }
    }

    let (outcome, affected_rows) = if matches.is_empty() {
        (UpsertOutcome::Appended, vec![merged.push_null_row()])
    } else if columns_added.is_empty() {
        (UpsertOutcome::Overwritten, matches)
    } else {
        (UpsertOutcome::Merged, matches)
    };
    for &row in &affected_rows {
        for column in observation.columns() {
            merged.set(&column.name, row, column.values[0].clone())?;
        }
    }

    Ok(Reconciled {
        snapshot: merged,
        outcome,
        affected_rows,
        columns_added,
    })
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Upsert engine bound to a relation store.
///
/// # Invariants
/// - Every upsert reads the full relation and writes it back with one replace.
/// - No in-process locking; concurrent writers must be serialized by callers.
pub struct UpsertEngine<S> {
    /// Backing relation store.
    store: S,
    /// Engine configuration.
    config: UpsertConfig,
    /// Audit sink for upsert events.
    audit: Arc<dyn AuditSink>,
}

impl<S: RelationStore> UpsertEngine<S> {
    /// Creates an engine with default configuration and no audit output.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, UpsertConfig::default())
    }

    /// Creates an engine with explicit configuration.
    #[must_use]
    pub fn with_config(store: S, config: UpsertConfig) -> Self {
        Self {
            store,
            config,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the engine configuration.
    pub const fn config(&self) -> &UpsertConfig {
        &self.config
    }

    /// Upserts one observation into `relation`, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError`] when validation, reconciliation, or storage
    /// fails. A failed replace leaves the relation's previous contents intact.
    pub fn upsert(&self, relation: &str, observation: &Snapshot) -> Result<UpsertReport, UpsertError> {
        validate_identifier(relation)?;
        let key = observation_key(observation, &self.config.key_column)?.to_string();

        let created_relation = if self.store.relation_exists(relation)? {
            false
        } else {
            self.store.create_relation(relation, &observation.column_specs())?;
            true
        };

        let existing = self.store.read_relation(relation)?;
        let rows_before = existing.row_count();
        let reconciled =
            reconcile(existing, observation, &self.config.key_column, self.config.duplicate_keys)?;
        self.store.replace_relation(relation, &reconciled.snapshot)?;

        let report = UpsertReport {
            relation: relation.to_string(),
            key,
            outcome: reconciled.outcome,
            created_relation,
            rows_before,
            rows_after: reconciled.snapshot.row_count(),
            columns_added: reconciled.columns_added,
        };
        self.audit.record_upsert(&UpsertAuditEvent::from_report(&report));
        Ok(report)
    }
}
