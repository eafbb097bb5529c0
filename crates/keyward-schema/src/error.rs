//! Schema error types.

use std::fmt;

use thiserror::Error;

use crate::model::Model;
use crate::validator::format_model;
use crate::value::Value;

/// What the validator expected at the failing path.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// A value matching this model.
    Model(Model),
    /// No value at all (undeclared key under strict mode).
    Nothing,
}

/// A structural validation failure.
///
/// Only the first failure found (depth-first) is reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Expected model, or nothing.
    pub expected: Expected,
    /// Received value; `None` when the value was absent.
    pub received: Option<Value>,
    /// Dotted / bracketed path to the failing value, empty at the root.
    pub path: String,
    /// Whether the failure is a missing required field.
    pub required: bool,
}

impl ValidationError {
    pub(crate) fn mismatch(model: &Model, received: Option<&Value>) -> Self {
        Self {
            expected: Expected::Model(model.clone()),
            received: received.cloned(),
            path: String::new(),
            required: false,
        }
    }

    pub(crate) fn missing(model: &Model) -> Self {
        Self {
            required: true,
            ..Self::mismatch(model, None)
        }
    }

    pub(crate) fn unexpected(received: &Value) -> Self {
        Self {
            expected: Expected::Nothing,
            received: Some(received.clone()),
            path: String::new(),
            required: false,
        }
    }

    pub(crate) fn under_key(mut self, key: &str) -> Self {
        self.path = if self.path.is_empty() {
            key.to_string()
        } else if self.path.starts_with('[') {
            format!("{key}{}", self.path)
        } else {
            format!("{key}.{}", self.path)
        };
        self
    }

    pub(crate) fn under_index(mut self, index: usize) -> Self {
        self.path = if self.path.is_empty() || self.path.starts_with('[') {
            format!("[{index}]{}", self.path)
        } else {
            format!("[{index}].{}", self.path)
        };
        self
    }

    /// Path for display; the root renders as `value`.
    pub fn display_path(&self) -> &str {
        if self.path.is_empty() {
            "value"
        } else {
            &self.path
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let received = self
            .received
            .as_ref()
            .map_or_else(|| "undefined".to_string(), Value::to_string);
        match &self.expected {
            Expected::Nothing => write!(
                f,
                "{}: unexpected field, expected nothing, received {received}",
                self.display_path()
            ),
            Expected::Model(model) if self.required => write!(
                f,
                "{}: missing required field, expected {}",
                self.display_path(),
                format_model(model)
            ),
            Expected::Model(model) => write!(
                f,
                "{}: expected {}, received {received}",
                self.display_path(),
                format_model(model)
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from parsing the textual model notation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Unknown primitive tag.
    #[error("unknown type tag `{0}`")]
    UnknownTag(String),

    /// Array notation must hold exactly one element schema.
    #[error("array model must hold exactly one element schema, found {0}")]
    ArrayArity(usize),

    /// `$required` is not a list of names.
    #[error("`$required` must be an array of field names")]
    InvalidRequired,

    /// `$strict` is not a boolean.
    #[error("`$strict` must be a boolean")]
    InvalidStrict,

    /// A required name has no field declaration.
    #[error("required field `{0}` is not declared")]
    UndeclaredRequired(String),

    /// Error inside a field model.
    #[error("field `{field}`: {source}")]
    InField {
        /// Field name.
        field: String,
        /// Inner error.
        source: Box<ModelError>,
    },

    /// Notation is not a string, array, or object.
    #[error("unsupported model notation: {0}")]
    Unsupported(String),
}

/// Errors from normalizing table schema declarations.
#[derive(Debug, Error)]
pub enum TableSchemaError {
    /// Declaration failed structural validation.
    #[error("table `{table}`: {source}")]
    Invalid {
        /// Table name.
        table: String,
        /// Validation failure.
        source: ValidationError,
    },

    /// Unknown column type name.
    #[error("table `{table}`, column `{column}`: unknown column type `{column_type}`")]
    UnknownColumnType {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Offending type name.
        column_type: String,
    },

    /// Malformed `type/length` shorthand.
    #[error("table `{table}`, column `{column}`: invalid shorthand `{notation}`")]
    InvalidShorthand {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Offending notation.
        notation: String,
    },

    /// Declared length is negative, fractional, or too large.
    #[error("table `{table}`, column `{column}`: invalid length {length}")]
    InvalidLength {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Offending length.
        length: f64,
    },

    /// The declaration root is not an object of tables.
    #[error("table schemas must be an object keyed by table name")]
    NotAnObject,

    /// Index references a column the table does not declare.
    #[error("table `{table}`: index references unknown column `{column}`")]
    UnknownIndexColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
}
