// crates/fundamentals-core/src/core/schema.rs
// ============================================================================
// Module: Fundamentals Schema Descriptors
// Description: Column declarations and scalar type mapping for relations.
// Purpose: Translate semantic column types into storage-engine declarations.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`ColumnSpec`] names a column and fixes its [`ScalarType`]. Column specs
//! are only consulted when a relation is created or rewritten; they never
//! change after declaration. Storage declarations use SQL type names and
//! double-quoted identifiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::snapshot::Scalar;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum identifier length (bytes) for relation and column names.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema declaration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Storage declaration has no scalar type mapping.
    #[error("unsupported column type: {0}")]
    UnsupportedType(String),
    /// Identifier is empty, too long, or contains control characters.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

// ============================================================================
// SECTION: Scalar Types
// ============================================================================

/// Semantic scalar type for a column.
///
/// # Invariants
/// - Each variant maps 1:1 to a storage declaration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Real,
    /// UTF-8 text.
    Text,
    /// Boolean, stored as 0/1.
    Boolean,
}

impl ScalarType {
    /// Returns the storage declaration name.
    #[must_use]
    pub const fn storage_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
        }
    }

    /// Parses a storage declaration name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] when the name has no mapping.
    pub fn from_storage_name(name: &str) -> Result<Self, SchemaError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "INTEGER" => Ok(Self::Integer),
            "REAL" => Ok(Self::Real),
            "TEXT" => Ok(Self::Text),
            "BOOLEAN" => Ok(Self::Boolean),
            _ => Err(SchemaError::UnsupportedType(name.to_string())),
        }
    }

    /// Infers a column type from its values.
    ///
    /// Booleans widen to integers and integers to reals, any text forces
    /// text, and an all-null column is treated as real.
    #[must_use]
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Scalar>) -> Self {
        let mut inferred: Option<Self> = None;
        for value in values {
            let Some(current) = value.scalar_type() else {
                continue;
            };
            inferred = Some(match (inferred, current) {
                (None, ty) => ty,
                (Some(Self::Text), _) | (_, Self::Text) => Self::Text,
                (Some(Self::Real), _) | (_, Self::Real) => Self::Real,
                (Some(Self::Integer), _) | (_, Self::Integer) => Self::Integer,
                (Some(Self::Boolean), Self::Boolean) => Self::Boolean,
            });
        }
        inferred.unwrap_or(Self::Real)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

// ============================================================================
// SECTION: Column Specs
// ============================================================================

/// Declared column for a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Column scalar type.
    pub scalar_type: ScalarType,
}

impl ColumnSpec {
    /// Declares a column.
    #[must_use]
    pub fn new(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
        }
    }

    /// Returns the storage declaration used in `CREATE TABLE`.
    #[must_use]
    pub fn storage_declaration(&self) -> String {
        format!("{} {}", quote_identifier(&self.name), self.scalar_type.storage_name())
    }
}

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Validates a relation or column identifier.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidIdentifier`] when the identifier is empty,
/// overlong, or contains control characters.
pub fn validate_identifier(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::InvalidIdentifier("identifier must not be empty".to_string()));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SchemaError::InvalidIdentifier(format!(
            "identifier exceeds {MAX_IDENTIFIER_LENGTH} bytes"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(SchemaError::InvalidIdentifier(
            "identifier contains control characters".to_string(),
        ));
    }
    Ok(())
}

/// Quotes an identifier for SQL, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
