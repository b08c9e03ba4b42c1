// crates/fundamentals-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Relation Store
// Description: Store file lifecycle and relation handles backed by SQLite.
// Purpose: Persist ledger relations with whole-table replace semantics.
// Dependencies: fundamentals-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`SqliteStore`] owns one connection to a `.db` file and hands out
//! [`Relation`] handles that borrow it. Handles never cache contents: every
//! read re-queries storage, and every write replaces the whole table inside a
//! single `IMMEDIATE` transaction.
//! Security posture: relation and column names are validated and quoted
//! before they reach SQL; cell values are always bound as parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fundamentals_core::ColumnSpec;
use fundamentals_core::RelationStore;
use fundamentals_core::Scalar;
use fundamentals_core::ScalarType;
use fundamentals_core::SchemaError;
use fundamentals_core::Snapshot;
use fundamentals_core::SnapshotColumn;
use fundamentals_core::StoreError;
use fundamentals_core::audit::AuditSink;
use fundamentals_core::audit::NoopAuditSink;
use fundamentals_core::audit::StoreAction;
use fundamentals_core::audit::StoreAuditEvent;
use fundamentals_core::quote_identifier;
use fundamentals_core::validate_identifier;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required store file extension.
pub const STORE_EXTENSION: &str = ".db";
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 8_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// Rollback journal; the store stays a single file.
    #[default]
    Delete,
    /// WAL journal mode.
    Wal,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Wal => "wal",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` relation store.
///
/// # Invariants
/// - `path` ends with `.db` and does not name a directory.
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default pragmas for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages never embed cell values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store file or relation already present.
    #[error("sqlite store already exists: {0}")]
    AlreadyExists(String),
    /// Store file or relation absent.
    #[error("sqlite store not found: {0}")]
    NotFound(String),
    /// Store path rejected.
    #[error("sqlite store invalid path: {0}")]
    InvalidPath(String),
    /// Busy timeout exhausted while waiting for a lock.
    #[error("sqlite store lock timeout: {0}")]
    LockTimeout(String),
    /// Declared column type or stored cell has no scalar mapping.
    #[error("sqlite store schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Malformed request.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::AlreadyExists(message) => Self::AlreadyExists(message),
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
            SqliteStoreError::InvalidPath(message) => Self::InvalidPath(message),
            SqliteStoreError::LockTimeout(message) => Self::LockTimeout(message),
            SqliteStoreError::SchemaMismatch(message) => Self::SchemaMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
        }
    }
}

impl From<SchemaError> for SqliteStoreError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::UnsupportedType(message) => Self::SchemaMismatch(message),
            SchemaError::InvalidIdentifier(message) => Self::Invalid(message),
        }
    }
}

/// Maps `SQLite` errors, surfacing lock contention as [`SqliteStoreError::LockTimeout`].
fn map_db_error(err: &rusqlite::Error) -> SqliteStoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            SqliteStoreError::LockTimeout(err.to_string())
        }
        _ => SqliteStoreError::Db(err.to_string()),
    }
}

// ============================================================================
// SECTION: Relation
// ============================================================================

/// Handle to one table inside a store.
///
/// # Invariants
/// - Borrows the store connection, so it never outlives the store.
/// - Holds no cached rows.
#[derive(Debug, Clone)]
pub struct Relation<'a> {
    /// Table name.
    name: String,
    /// Connection of the owning store.
    connection: &'a Connection,
}

impl<'a> Relation<'a> {
    /// Returns the catalog spelling of a table name, matching `name`
    /// ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the catalog query fails.
    pub fn stored_name(
        connection: &Connection,
        name: &str,
    ) -> Result<Option<String>, SqliteStoreError> {
        connection
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| map_db_error(&err))
    }

    /// Returns true when a table with this name exists, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the catalog query fails.
    pub fn exists(connection: &Connection, name: &str) -> Result<bool, SqliteStoreError> {
        Ok(Self::stored_name(connection, name)?.is_some())
    }

    /// Creates a table with all `columns` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::AlreadyExists`] when the table exists and
    /// [`SqliteStoreError::Invalid`] when `columns` is empty or a name is
    /// rejected.
    pub fn create(
        connection: &'a Connection,
        name: &str,
        columns: &[ColumnSpec],
    ) -> Result<Self, SqliteStoreError> {
        validate_identifier(name)?;
        if columns.is_empty() {
            return Err(SqliteStoreError::Invalid(format!(
                "relation {name} needs at least one column"
            )));
        }
        let tx = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)
            .map_err(|err| map_db_error(&err))?;
        if Self::exists(&tx, name)? {
            return Err(SqliteStoreError::AlreadyExists(format!("relation {name}")));
        }
        tx.execute_batch(&create_table_sql(name, columns)?).map_err(|err| map_db_error(&err))?;
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(Self {
            name: name.to_string(),
            connection,
        })
    }

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the table is absent.
    pub fn delete(connection: &Connection, name: &str) -> Result<(), SqliteStoreError> {
        let tx = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)
            .map_err(|err| map_db_error(&err))?;
        if !Self::exists(&tx, name)? {
            return Err(SqliteStoreError::NotFound(format!("relation {name}")));
        }
        tx.execute_batch(&format!("DROP TABLE {};", quote_identifier(name)))
            .map_err(|err| map_db_error(&err))?;
        tx.commit().map_err(|err| map_db_error(&err))
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared columns in table order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::SchemaMismatch`] for an unsupported
    /// declared type.
    pub fn columns(&self) -> Result<Vec<ColumnSpec>, SqliteStoreError> {
        Ok(self
            .declared_columns()?
            .into_iter()
            .map(|(name, declared)| ColumnSpec::new(name, declared.unwrap_or(ScalarType::Real)))
            .collect())
    }

    /// Replaces the table contents with `snapshot`: drop, recreate, and
    /// insert every row inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when any step fails; the transaction is
    /// rolled back and the previous contents stay intact.
    pub fn replace_all(&self, snapshot: &Snapshot) -> Result<(), SqliteStoreError> {
        validate_identifier(&self.name)?;
        let specs = snapshot.column_specs();
        if specs.is_empty() {
            return Err(SqliteStoreError::Invalid(format!(
                "relation {} needs at least one column",
                self.name
            )));
        }
        let table = quote_identifier(&self.name);
        let tx = Transaction::new_unchecked(self.connection, TransactionBehavior::Immediate)
            .map_err(|err| map_db_error(&err))?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))
            .map_err(|err| map_db_error(&err))?;
        tx.execute_batch(&create_table_sql(&self.name, &specs)?)
            .map_err(|err| map_db_error(&err))?;
        {
            let columns: Vec<String> =
                specs.iter().map(|spec| quote_identifier(&spec.name)).collect();
            let placeholders: Vec<String> =
                (1 ..= specs.len()).map(|index| format!("?{index}")).collect();
            let mut statement = tx
                .prepare(&format!(
                    "INSERT INTO {table} ({}) VALUES ({})",
                    columns.join(", "),
                    placeholders.join(", ")
                ))
                .map_err(|err| map_db_error(&err))?;
            for row in snapshot.rows() {
                statement
                    .execute(params_from_iter(row.into_iter().map(to_sql_value)))
                    .map_err(|err| map_db_error(&err))?;
            }
        }
        tx.commit().map_err(|err| map_db_error(&err))
    }

    /// Reads every row and column in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the table is gone and
    /// [`SqliteStoreError::SchemaMismatch`] for unsupported types or BLOB
    /// cells.
    pub fn read_all(&self) -> Result<Snapshot, SqliteStoreError> {
        let declared = self.declared_columns()?;
        if declared.is_empty() {
            return Err(SqliteStoreError::NotFound(format!("relation {}", self.name)));
        }
        let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); declared.len()];
        let mut statement = self
            .connection
            .prepare(&format!("SELECT * FROM {}", quote_identifier(&self.name)))
            .map_err(|err| map_db_error(&err))?;
        let mut rows = statement.query([]).map_err(|err| map_db_error(&err))?;
        while let Some(row) = rows.next().map_err(|err| map_db_error(&err))? {
            for (index, (name, declared_type)) in declared.iter().enumerate() {
                let cell = row.get_ref(index).map_err(|err| map_db_error(&err))?;
                values[index].push(from_sql_value(cell, *declared_type, name)?);
            }
        }
        let columns = declared
            .into_iter()
            .zip(values)
            .map(|((name, declared_type), values)| match declared_type {
                Some(scalar_type) => SnapshotColumn::new(name, scalar_type, values),
                None => SnapshotColumn::inferred(name, values),
            })
            .collect();
        Snapshot::from_columns(columns).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
    }

    /// Reads column names and declared types from the catalog.
    fn declared_columns(&self) -> Result<Vec<(String, Option<ScalarType>)>, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![self.name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|err| map_db_error(&err))?;
        let mut columns = Vec::new();
        for row in rows {
            let (name, declared) = row.map_err(|err| map_db_error(&err))?;
            let scalar_type = if declared.trim().is_empty() {
                None
            } else {
                Some(ScalarType::from_storage_name(&declared)?)
            };
            columns.push((name, scalar_type));
        }
        Ok(columns)
    }
}

/// Builds a `CREATE TABLE` statement with every column declaration.
fn create_table_sql(name: &str, columns: &[ColumnSpec]) -> Result<String, SqliteStoreError> {
    for column in columns {
        validate_identifier(&column.name)?;
    }
    let declarations: Vec<String> = columns.iter().map(ColumnSpec::storage_declaration).collect();
    Ok(format!("CREATE TABLE {} ({});", quote_identifier(name), declarations.join(", ")))
}

/// Converts a scalar into a bound `SQLite` value.
fn to_sql_value(value: &Scalar) -> Value {
    match value {
        Scalar::Null => Value::Null,
        Scalar::Integer(value) => Value::Integer(*value),
        Scalar::Real(value) => Value::Real(*value),
        Scalar::Text(value) => Value::Text(value.clone()),
        Scalar::Boolean(value) => Value::Integer(i64::from(*value)),
    }
}

/// Converts a stored cell into a scalar.
fn from_sql_value(
    cell: ValueRef<'_>,
    declared: Option<ScalarType>,
    column: &str,
) -> Result<Scalar, SqliteStoreError> {
    match cell {
        ValueRef::Null => Ok(Scalar::Null),
        ValueRef::Integer(value) if declared == Some(ScalarType::Boolean) => {
            Ok(Scalar::Boolean(value != 0))
        }
        ValueRef::Integer(value) => Ok(Scalar::Integer(value)),
        ValueRef::Real(value) => Ok(Scalar::Real(value)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| Scalar::Text(text.to_string()))
            .map_err(|_| {
                SqliteStoreError::SchemaMismatch(format!("column {column} holds non-utf8 text"))
            }),
        ValueRef::Blob(_) => {
            Err(SqliteStoreError::SchemaMismatch(format!("column {column} holds a blob")))
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed relation store.
///
/// # Invariants
/// - Exactly one connection per store, owned for the store's lifetime.
/// - The backing file always ends with `.db`.
pub struct SqliteStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Open connection.
    connection: Connection,
    /// Audit sink for relation administration.
    audit: Arc<dyn AuditSink>,
}

impl SqliteStore {
    /// Returns true only when `path` ends with `.db` and the file exists.
    #[must_use]
    pub fn exists(path: &Path) -> bool {
        has_store_extension(path) && path.is_file()
    }

    /// Creates an empty store file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::AlreadyExists`] when the store exists and
    /// [`SqliteStoreError::InvalidPath`] when the path is rejected.
    pub fn create(path: &Path) -> Result<(), SqliteStoreError> {
        if Self::exists(path) {
            return Err(SqliteStoreError::AlreadyExists(path.display().to_string()));
        }
        if !has_store_extension(path) {
            return Err(SqliteStoreError::InvalidPath(format!(
                "{} must end in {STORE_EXTENSION}",
                path.display()
            )));
        }
        validate_store_path(path)?;
        ensure_parent_dir(path)?;
        OpenOptions::new().write(true).create_new(true).open(path).map_err(|err| {
            if err.kind() == io::ErrorKind::AlreadyExists {
                SqliteStoreError::AlreadyExists(path.display().to_string())
            } else {
                SqliteStoreError::Io(err.to_string())
            }
        })?;
        Ok(())
    }

    /// Opens a store, creating the file first when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is rejected or the
    /// connection cannot be configured.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        if !Self::exists(&config.path) {
            Self::create(&config.path)?;
        }
        let connection = open_connection(&config)?;
        Ok(Self {
            config,
            connection,
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Deletes a store file and any journal sidecars.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::InvalidPath`] for a wrong extension and
    /// [`SqliteStoreError::NotFound`] when the file is absent.
    pub fn delete(path: &Path) -> Result<(), SqliteStoreError> {
        if !has_store_extension(path) {
            return Err(SqliteStoreError::InvalidPath(format!(
                "{} must end in {STORE_EXTENSION}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(SqliteStoreError::NotFound(path.display().to_string()));
        }
        std::fs::remove_file(path).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        for suffix in ["-wal", "-shm", "-journal"] {
            let mut sidecar = path.as_os_str().to_owned();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.is_file() {
                std::fs::remove_file(&sidecar)
                    .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
            }
        }
        Ok(())
    }

    /// Replaces the audit sink used for relation administration.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the store file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns true when the relation exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the catalog query fails.
    pub fn relation_exists(&self, name: &str) -> Result<bool, SqliteStoreError> {
        Relation::exists(&self.connection, name)
    }

    /// Creates a relation.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::AlreadyExists`] when the name is taken.
    pub fn add_relation(
        &self,
        name: &str,
        columns: &[ColumnSpec],
    ) -> Result<Relation<'_>, SqliteStoreError> {
        let relation = Relation::create(&self.connection, name, columns)?;
        self.audit.record_store(&StoreAuditEvent::new(StoreAction::AddRelation, name));
        Ok(relation)
    }

    /// Drops a relation.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the relation is absent.
    pub fn drop_relation(&self, name: &str) -> Result<(), SqliteStoreError> {
        Relation::delete(&self.connection, name)?;
        self.audit.record_store(&StoreAuditEvent::new(StoreAction::DropRelation, name));
        Ok(())
    }

    /// Returns a handle to an existing relation.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the relation is absent.
    pub fn relation(&self, name: &str) -> Result<Relation<'_>, SqliteStoreError> {
        let stored = Relation::stored_name(&self.connection, name)?
            .ok_or_else(|| SqliteStoreError::NotFound(format!("relation {name}")))?;
        Ok(self.handle(&stored))
    }

    /// Returns a handle without checking the catalog.
    fn handle(&self, name: &str) -> Relation<'_> {
        Relation {
            name: name.to_string(),
            connection: &self.connection,
        }
    }

    /// Lists relation names, excluding `SQLite` internal tables, ordered by
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the catalog query fails.
    pub fn relation_names(&self) -> Result<Vec<String>, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows =
            statement.query_map([], |row| row.get::<_, String>(0)).map_err(|err| map_db_error(&err))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| map_db_error(&err))
    }

    /// Returns handles to every relation, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the catalog query fails.
    pub fn relations(&self) -> Result<Vec<Relation<'_>>, SqliteStoreError> {
        Ok(self.relation_names()?.iter().map(|name| self.handle(name)).collect())
    }
}

impl RelationStore for SqliteStore {
    fn relation_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(Self::relation_exists(self, name)?)
    }

    fn create_relation(&self, name: &str, columns: &[ColumnSpec]) -> Result<(), StoreError> {
        self.add_relation(name, columns)?;
        Ok(())
    }

    fn read_relation(&self, name: &str) -> Result<Snapshot, StoreError> {
        Ok(self.relation(name)?.read_all()?)
    }

    fn replace_relation(&self, name: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        let stored = Relation::stored_name(&self.connection, name)?;
        Ok(self.handle(stored.as_deref().unwrap_or(name)).replace_all(snapshot)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when the path literally ends with `.db`.
fn has_store_extension(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().ends_with(STORE_EXTENSION)
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
        }
        _ => Ok(()),
    }
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::InvalidPath("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::InvalidPath("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::InvalidPath(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::InvalidPath(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection on an existing store file.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| map_db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy timeout settings.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| map_db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| map_db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| map_db_error(&err))?;
    Ok(())
}
