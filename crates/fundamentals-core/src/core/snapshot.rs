// crates/fundamentals-core/src/core/snapshot.rs
// ============================================================================
// Module: Fundamentals Snapshots
// Description: In-memory tabular copies of relation contents.
// Purpose: Provide the sole interchange shape between storage and the upsert engine.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Snapshot`] is an ordered set of named columns, each an ordered vector
//! of [`Scalar`] cells. Snapshots are built fresh for every read and dropped
//! after every write; they never alias storage.
//!
//! # Invariants
//! - Every column holds exactly [`Snapshot::row_count`] values.
//! - Column names are unique within a snapshot.
//! - Column order is insertion order and carries no meaning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::schema::ColumnSpec;
use crate::core::schema::ScalarType;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Snapshot construction and access errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Columns disagree on row count.
    #[error("column {column} has {actual} rows (expected {expected})")]
    RaggedColumns {
        /// Offending column name.
        column: String,
        /// Expected row count.
        expected: usize,
        /// Actual row count.
        actual: usize,
    },
    /// Column name appears more than once.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    /// Column name not present.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

// ============================================================================
// SECTION: Scalars
// ============================================================================

/// A single cell value.
///
/// `Null` is the missing marker used to fill cells introduced by column or
/// row unions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Missing marker.
    Null,
    /// Integer value.
    Integer(i64),
    /// Real value.
    Real(f64),
    /// Text value.
    Text(String),
    /// Boolean value.
    Boolean(bool),
}

impl Scalar {
    /// Returns the scalar type of the value, or `None` for `Null`.
    #[must_use]
    pub const fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(ScalarType::Integer),
            Self::Real(_) => Some(ScalarType::Real),
            Self::Text(_) => Some(ScalarType::Text),
            Self::Boolean(_) => Some(ScalarType::Boolean),
        }
    }

    /// Returns true for the missing marker.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text payload when the value is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the value as a float when numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "Integer cells are reported as approximate reals.")]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(value) => value.fmt(f),
            Self::Real(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
            Self::Boolean(value) => value.fmt(f),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// SECTION: Snapshot Types
// ============================================================================

/// One named column of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotColumn {
    /// Column name.
    pub name: String,
    /// Declared or inferred scalar type.
    pub scalar_type: ScalarType,
    /// Cell values in row order.
    pub values: Vec<Scalar>,
}

impl SnapshotColumn {
    /// Creates a column with an explicit type.
    #[must_use]
    pub fn new(name: impl Into<String>, scalar_type: ScalarType, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            scalar_type,
            values,
        }
    }

    /// Creates a column whose type is inferred from its values.
    #[must_use]
    pub fn inferred(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        let scalar_type = ScalarType::infer(&values);
        Self::new(name, scalar_type, values)
    }

    /// Returns the column declaration.
    #[must_use]
    pub fn spec(&self) -> ColumnSpec {
        ColumnSpec::new(self.name.clone(), self.scalar_type)
    }
}

/// In-memory tabular copy of a relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Columns in insertion order.
    columns: Vec<SnapshotColumn>,
    /// Shared row count across all columns.
    row_count: usize,
}

impl Snapshot {
    /// Creates an empty snapshot with no columns and no rows.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Builds a snapshot from columns, enforcing shape invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when columns are ragged or names repeat,
    /// including names that differ only in ASCII case.
    pub fn from_columns(columns: Vec<SnapshotColumn>) -> Result<Self, SnapshotError> {
        let row_count = columns.first().map_or(0, |column| column.values.len());
        for (index, column) in columns.iter().enumerate() {
            if column.values.len() != row_count {
                return Err(SnapshotError::RaggedColumns {
                    column: column.name.clone(),
                    expected: row_count,
                    actual: column.values.len(),
                });
            }
            if columns[.. index].iter().any(|previous| same_name(&previous.name, &column.name)) {
                return Err(SnapshotError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self {
            columns,
            row_count,
        })
    }

    /// Builds a zero-row snapshot with the given column declarations.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateColumn`] when names repeat.
    pub fn with_schema(specs: &[ColumnSpec]) -> Result<Self, SnapshotError> {
        Self::from_columns(
            specs
                .iter()
                .map(|spec| SnapshotColumn::new(spec.name.clone(), spec.scalar_type, Vec::new()))
                .collect(),
        )
    }

    /// Builds a one-row snapshot from declared fields.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateColumn`] when names repeat.
    pub fn single_row(
        fields: impl IntoIterator<Item = (ColumnSpec, Scalar)>,
    ) -> Result<Self, SnapshotError> {
        Self::from_columns(
            fields
                .into_iter()
                .map(|(spec, value)| SnapshotColumn::new(spec.name, spec.scalar_type, vec![value]))
                .collect(),
        )
    }

    /// Returns the columns in insertion order.
    #[must_use]
    pub fn columns(&self) -> &[SnapshotColumn] {
        &self.columns
    }

    /// Consumes the snapshot, returning its columns.
    #[must_use]
    pub fn into_columns(self) -> Vec<SnapshotColumn> {
        self.columns
    }

    /// Returns column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Returns column declarations in insertion order.
    #[must_use]
    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        self.columns.iter().map(SnapshotColumn::spec).collect()
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the snapshot has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Returns the position of a column by name, ignoring ASCII case.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| same_name(&column.name, name))
    }

    /// Returns a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&SnapshotColumn> {
        self.columns.iter().find(|column| same_name(&column.name, name))
    }

    /// Returns true when the column exists.
    #[must_use]
    pub fn contains_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns a single cell.
    #[must_use]
    pub fn value(&self, column: &str, row: usize) -> Option<&Scalar> {
        self.column(column).and_then(|column| column.values.get(row))
    }

    /// Returns one row as cell references in column order.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<Vec<&Scalar>> {
        if row >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|column| &column.values[row]).collect())
    }

    /// Iterates over rows as cell references in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Scalar>> {
        (0 .. self.row_count).map(|row| self.columns.iter().map(|column| &column.values[row]).collect())
    }

    /// Appends a column filled with the missing marker and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateColumn`] when the name is taken.
    pub fn push_null_column(&mut self, spec: &ColumnSpec) -> Result<usize, SnapshotError> {
        if self.contains_column(&spec.name) {
            return Err(SnapshotError::DuplicateColumn(spec.name.clone()));
        }
        self.columns.push(SnapshotColumn::new(
            spec.name.clone(),
            spec.scalar_type,
            vec![Scalar::Null; self.row_count],
        ));
        Ok(self.columns.len() - 1)
    }

    /// Appends a row filled with the missing marker and returns its index.
    pub fn push_null_row(&mut self) -> usize {
        for column in &mut self.columns {
            column.values.push(Scalar::Null);
        }
        self.row_count += 1;
        self.row_count - 1
    }

    /// Overwrites a single cell.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnknownColumn`] when the column is missing.
    /// Out-of-range rows are reported the same way with the row index.
    pub fn set(&mut self, column: &str, row: usize, value: Scalar) -> Result<(), SnapshotError> {
        let cell = self
            .columns
            .iter_mut()
            .find(|candidate| same_name(&candidate.name, column))
            .and_then(|candidate| candidate.values.get_mut(row))
            .ok_or_else(|| SnapshotError::UnknownColumn(format!("{column}[{row}]")))?;
        *cell = value;
        Ok(())
    }

    /// Redeclares a column's scalar type.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnknownColumn`] when the column is missing.
    pub fn set_column_type(
        &mut self,
        column: &str,
        scalar_type: ScalarType,
    ) -> Result<(), SnapshotError> {
        let target = self
            .columns
            .iter_mut()
            .find(|candidate| same_name(&candidate.name, column))
            .ok_or_else(|| SnapshotError::UnknownColumn(column.to_string()))?;
        target.scalar_type = scalar_type;
        Ok(())
    }
}

/// Compares column names the way the storage engine resolves identifiers.
fn same_name(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::Scalar;
    use super::Snapshot;
    use super::SnapshotColumn;
    use super::SnapshotError;
    use crate::core::schema::ColumnSpec;
    use crate::core::schema::ScalarType;

    #[test]
    fn ragged_columns_are_rejected() {
        let result = Snapshot::from_columns(vec![
            SnapshotColumn::inferred("Date", vec!["2024-01-01".into()]),
            SnapshotColumn::inferred("PE", vec![]),
        ]);
        assert_eq!(
            result,
            Err(SnapshotError::RaggedColumns {
                column: "PE".to_string(),
                expected: 1,
                actual: 0,
            })
        );
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let result = Snapshot::from_columns(vec![
            SnapshotColumn::inferred("PE", vec![Scalar::Real(1.0)]),
            SnapshotColumn::inferred("PE", vec![Scalar::Real(2.0)]),
        ]);
        assert_eq!(result, Err(SnapshotError::DuplicateColumn("PE".to_string())));
    }

    #[test]
    fn null_columns_and_rows_keep_shape() {
        let mut snapshot = Snapshot::single_row([(
            ColumnSpec::new("Date", ScalarType::Text),
            Scalar::from("2024-01-01"),
        )])
        .unwrap();
        snapshot.push_null_column(&ColumnSpec::new("PE", ScalarType::Real)).unwrap();
        let row = snapshot.push_null_row();
        assert_eq!(row, 1);
        assert_eq!(snapshot.row_count(), 2);
        assert_eq!(snapshot.value("PE", 0), Some(&Scalar::Null));
        assert_eq!(snapshot.value("Date", 1), Some(&Scalar::Null));
        snapshot.set("PE", 1, Scalar::Real(9.0)).unwrap();
        assert_eq!(snapshot.row(1), Some(vec![&Scalar::Null, &Scalar::Real(9.0)]));
        assert!(snapshot.set("PE", 5, Scalar::Null).is_err());
    }

    #[test]
    fn optional_values_convert_to_missing_marker() {
        assert_eq!(Scalar::from(None::<f64>), Scalar::Null);
        assert_eq!(Scalar::from(Some(1.5)), Scalar::Real(1.5));
    }

    #[test]
    fn column_names_match_ignoring_ascii_case() {
        let result = Snapshot::from_columns(vec![
            SnapshotColumn::inferred("PE", vec![Scalar::Real(1.0)]),
            SnapshotColumn::inferred("pe", vec![Scalar::Real(2.0)]),
        ]);
        assert_eq!(result, Err(SnapshotError::DuplicateColumn("pe".to_string())));

        let mut snapshot = Snapshot::single_row([
            (ColumnSpec::new("Date", ScalarType::Text), Scalar::from("2024-01-01")),
            (ColumnSpec::new("PE", ScalarType::Real), Scalar::Real(10.0)),
        ])
        .unwrap();
        assert_eq!(snapshot.column_index("pe"), Some(1));
        assert_eq!(snapshot.column("date").map(|column| column.name.as_str()), Some("Date"));
        snapshot.set("pe", 0, Scalar::Real(12.0)).unwrap();
        assert_eq!(snapshot.value("PE", 0), Some(&Scalar::Real(12.0)));
        assert_eq!(
            snapshot.push_null_column(&ColumnSpec::new("pE", ScalarType::Real)),
            Err(SnapshotError::DuplicateColumn("pE".to_string()))
        );
    }
}
