// crates/fundamentals-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `fundamentals.toml`. The output is deterministic and
//! must always pass [`crate::FundamentalsConfig::from_toml`].

/// Returns a canonical example `fundamentals.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[store]
path = "fundamentals.db"
busy_timeout_ms = 8000
journal_mode = "delete"
sync_mode = "full"

[ledger]
relation = "Fundamentals"
key_column = "Date"
duplicate_keys = "preserve"

[audit]
sink = "file"
path = "fundamentals-audit.jsonl"
"#,
    )
}
