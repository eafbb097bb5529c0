//! Column type definitions.

use std::fmt;

/// Storage types a column can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// UTF-8 string.
    String,
    /// Binary data.
    Binary,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// Boolean value.
    Boolean,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
}

impl ColumnType {
    /// Parse a column type name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ColumnType::String),
            "binary" => Some(ColumnType::Binary),
            "integer" => Some(ColumnType::Integer),
            "float" => Some(ColumnType::Float),
            "boolean" => Some(ColumnType::Boolean),
            "timestamp" => Some(ColumnType::Timestamp),
            _ => None,
        }
    }

    /// Type name as written in declarations.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Binary => "binary",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
