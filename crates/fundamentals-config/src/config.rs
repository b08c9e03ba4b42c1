// crates/fundamentals-config/src/config.rs
// ============================================================================
// Module: Fundamentals Configuration
// Description: Configuration loading and validation for the fundamentals ledger.
// Purpose: Provide strict, fail-closed config parsing with safe defaults.
// Dependencies: fundamentals-core, fundamentals-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from `fundamentals.toml` (or the path named by
//! `FUNDAMENTALS_CONFIG`) and validated before use. An explicitly requested
//! file must exist; a missing default file yields the built-in defaults.
//!
//! Security posture: config inputs are untrusted; size, encoding, and path
//! limits are enforced before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use fundamentals_core::AuditSink;
use fundamentals_core::DEFAULT_KEY_COLUMN;
use fundamentals_core::DEFAULT_LEDGER_RELATION;
use fundamentals_core::DuplicateKeyPolicy;
use fundamentals_core::FileAuditSink;
use fundamentals_core::NoopAuditSink;
use fundamentals_core::StderrAuditSink;
use fundamentals_core::UpsertConfig;
use fundamentals_core::validate_identifier;
use fundamentals_store_sqlite::STORE_EXTENSION;
use fundamentals_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config filename when no override is supplied.
pub(crate) const DEFAULT_CONFIG_NAME: &str = "fundamentals.toml";
/// Environment variable for config path overrides.
pub(crate) const CONFIG_ENV_VAR: &str = "FUNDAMENTALS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default store file.
pub(crate) const DEFAULT_STORE_PATH: &str = "fundamentals.db";
/// Maximum busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level fundamentals configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundamentalsConfig {
    /// `SQLite` store configuration.
    #[serde(default = "default_store_config")]
    pub store: SqliteStoreConfig,
    /// Ledger relation and upsert settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for FundamentalsConfig {
    fn default() -> Self {
        Self {
            store: default_store_config(),
            ledger: LedgerConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl FundamentalsConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        self.ledger.validate()?;
        self.audit.validate()
    }
}

/// Returns the default store configuration.
fn default_store_config() -> SqliteStoreConfig {
    SqliteStoreConfig::new(DEFAULT_STORE_PATH)
}

/// Validates store settings.
fn validate_store(store: &SqliteStoreConfig) -> Result<(), ConfigError> {
    validate_path_string("store.path", &store.path)?;
    if !store.path.to_string_lossy().ends_with(STORE_EXTENSION) {
        return Err(ConfigError::Invalid(format!("store.path must end in {STORE_EXTENSION}")));
    }
    if store.busy_timeout_ms == 0 || store.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "store.busy_timeout_ms must be between 1 and {MAX_BUSY_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Ledger relation and upsert settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Relation receiving metric observations.
    #[serde(default = "default_relation")]
    pub relation: String,
    /// Key column holding observation dates.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    /// Handling of relations that already hold duplicate dates.
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            relation: default_relation(),
            key_column: default_key_column(),
            duplicate_keys: DuplicateKeyPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Returns the upsert engine configuration.
    #[must_use]
    pub fn upsert_config(&self) -> UpsertConfig {
        UpsertConfig {
            key_column: self.key_column.clone(),
            duplicate_keys: self.duplicate_keys,
        }
    }

    /// Validates ledger names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier(&self.relation)
            .map_err(|err| ConfigError::Invalid(format!("ledger.relation: {err}")))?;
        validate_identifier(&self.key_column)
            .map_err(|err| ConfigError::Invalid(format!("ledger.key_column: {err}")))?;
        Ok(())
    }
}

/// Returns the default ledger relation.
fn default_relation() -> String {
    DEFAULT_LEDGER_RELATION.to_string()
}

/// Returns the default key column.
fn default_key_column() -> String {
    DEFAULT_KEY_COLUMN.to_string()
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Drop audit events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Audit configuration.
///
/// # Invariants
/// - `path` is set exactly when `sink` is [`AuditSinkKind::File`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates sink and path pairing.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires audit.path".to_string()))
            }
            (AuditSinkKind::None | AuditSinkKind::Stderr, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid with the file sink".to_string(),
            )),
            (AuditSinkKind::None | AuditSinkKind::Stderr, None) => Ok(()),
        }
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
            (AuditSinkKind::File, Some(path)) => Ok(Arc::new(
                FileAuditSink::new(path).map_err(|err| ConfigError::Io(err.to_string()))?,
            )),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires audit.path".to_string()))
            }
            (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults; the flag is
/// true when the path was requested explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path value against length constraints.
fn validate_path_string(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} component too long")));
        }
    }
    Ok(())
}
