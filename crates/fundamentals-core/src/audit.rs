// crates/fundamentals-core/src/audit.rs
// ============================================================================
// Module: Fundamentals Audit Logging
// Description: Structured audit events for upserts and store administration.
// Purpose: Emit JSON-line logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for ledger writes. It
//! is intentionally lightweight so deployments can route events to their
//! preferred logging pipeline without redesign. Events never carry cell
//! values, only relation names, keys, and shape counters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::runtime::UpsertOutcome;
use crate::runtime::UpsertReport;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Upsert audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Relation written.
    pub relation: String,
    /// Key value of the observation.
    pub key: String,
    /// Reconciliation outcome.
    pub outcome: UpsertOutcome,
    /// Whether the relation was created by this upsert.
    pub created_relation: bool,
    /// Row count before the upsert.
    pub rows_before: usize,
    /// Row count after the upsert.
    pub rows_after: usize,
    /// Columns introduced by this upsert.
    pub columns_added: Vec<String>,
}

/// Store administration actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreAction {
    /// Database file created.
    CreateStore,
    /// Database file deleted.
    DeleteStore,
    /// Relation created.
    AddRelation,
    /// Relation dropped.
    DropRelation,
}

/// Store administration audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct StoreAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Action performed.
    pub action: StoreAction,
    /// Store path or relation name the action applied to.
    pub target: String,
}

impl UpsertAuditEvent {
    /// Creates an audit event from an upsert report.
    #[must_use]
    pub fn from_report(report: &UpsertReport) -> Self {
        Self {
            event: "upsert",
            timestamp_ms: now_millis(),
            relation: report.relation.clone(),
            key: report.key.clone(),
            outcome: report.outcome,
            created_relation: report.created_relation,
            rows_before: report.rows_before,
            rows_after: report.rows_after,
            columns_added: report.columns_added.clone(),
        }
    }
}

impl StoreAuditEvent {
    /// Creates a store audit event with a consistent timestamp.
    #[must_use]
    pub fn new(action: StoreAction, target: impl Into<String>) -> Self {
        Self {
            event: "store_admin",
            timestamp_ms: now_millis(),
            action,
            target: target.into(),
        }
    }
}

/// Returns the current unix epoch in milliseconds.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for ledger events.
pub trait AuditSink: Send + Sync {
    /// Record an upsert event.
    fn record_upsert(&self, event: &UpsertAuditEvent);

    /// Record a store administration event.
    fn record_store(&self, _event: &StoreAuditEvent) {}
}

/// Audit sink that drops all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_upsert(&self, _event: &UpsertAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record_upsert(&self, event: &UpsertAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_store(&self, event: &StoreAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized payload.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_upsert(&self, event: &UpsertAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_store(&self, event: &StoreAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

/// Audit sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    /// Recorded upsert events.
    upserts: Mutex<Vec<UpsertAuditEvent>>,
    /// Recorded store events.
    store_events: Mutex<Vec<StoreAuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded upsert events.
    #[must_use]
    pub fn upserts(&self) -> Vec<UpsertAuditEvent> {
        self.upserts.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns recorded store events.
    #[must_use]
    pub fn store_events(&self) -> Vec<StoreAuditEvent> {
        self.store_events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record_upsert(&self, event: &UpsertAuditEvent) {
        if let Ok(mut guard) = self.upserts.lock() {
            guard.push(event.clone());
        }
    }

    fn record_store(&self, event: &StoreAuditEvent) {
        if let Ok(mut guard) = self.store_events.lock() {
            guard.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::fs;

    use super::AuditSink;
    use super::FileAuditSink;
    use super::StoreAction;
    use super::StoreAuditEvent;
    use super::UpsertAuditEvent;
    use crate::runtime::UpsertOutcome;
    use crate::runtime::UpsertReport;

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileAuditSink::new(&path).unwrap();
        let report = UpsertReport {
            relation: "Fundamentals".to_string(),
            key: "2024-01-01".to_string(),
            outcome: UpsertOutcome::Appended,
            created_relation: true,
            rows_before: 0,
            rows_after: 1,
            columns_added: Vec::new(),
        };
        sink.record_upsert(&UpsertAuditEvent::from_report(&report));
        sink.record_store(&StoreAuditEvent::new(StoreAction::DropRelation, "Fundamentals"));
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "upsert");
        assert_eq!(first["outcome"], "appended");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["action"], "drop_relation");
    }
}
