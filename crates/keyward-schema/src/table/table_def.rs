//! Table definitions.

use super::column::ColumnDef;
use super::index::IndexDef;

/// A table declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name (unique within the schemas).
    pub name: String,
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
    /// Table-level indexes.
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Add an index.
    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check whether values of `column` are guaranteed unique.
    pub fn has_unique_index(&self, column: &str) -> bool {
        self.get_column(column).is_some_and(|c| c.unique)
            || self.indexes.iter().any(|i| i.is_unique_on(column))
    }

    /// Names of all columns guaranteed unique.
    pub fn unique_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| self.has_unique_index(name))
    }
}
