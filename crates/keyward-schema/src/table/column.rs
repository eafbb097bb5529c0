//! Column definitions for tables.

use super::types::ColumnType;

/// A column definition within a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column storage type.
    pub column_type: ColumnType,
    /// Declared length for sized types.
    pub length: Option<u32>,
    /// Whether the column carries its own unique index.
    pub unique: bool,
    /// Whether the column accepts null.
    pub nullable: bool,
}

impl ColumnDef {
    /// Create a new non-nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            unique: false,
            nullable: false,
        }
    }

    /// Set the declared length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Mark as unique.
    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Check the column is of `column_type` and at least `min_length` long.
    pub fn satisfies(&self, column_type: ColumnType, min_length: u32) -> bool {
        self.column_type == column_type && self.length.unwrap_or(0) >= min_length
    }
}
