//! Table schemas: every table the host declares.
//!
//! Declarations arrive as JSON and accept two column notations that are
//! normalized into the same [`ColumnDef`]:
//!
//! ```json
//! {
//!   "User": {
//!     "columns": {
//!       "email": { "type": "string", "length": 40, "unique": true },
//!       "password": "binary/64",
//!       "salt": "binary/16",
//!       "createdAt": "timestamp"
//!     },
//!     "indexes": [ { "columns": ["email"], "unique": true } ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use super::{ColumnDef, ColumnType, IndexDef, TableDef};
use crate::error::{TableSchemaError, ValidationError};
use crate::model::Model;
use crate::validator::validate;
use crate::value::Value;

/// All table declarations, keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchemas {
    tables: BTreeMap<String, TableDef>,
}

fn table_model() -> Model {
    Model::object()
        .required_field("columns", Model::any())
        .field(
            "indexes",
            Model::array_of(
                Model::object()
                    .required_field("columns", Model::array_of(Model::string()))
                    .field("unique", Model::boolean())
                    .strict()
                    .into(),
            ),
        )
        .strict()
        .into()
}

fn column_model() -> Model {
    Model::object()
        .required_field("type", Model::string())
        .field("length", Model::integer())
        .field("unique", Model::boolean())
        .field("nullable", Model::boolean())
        .strict()
        .into()
}

impl TableSchemas {
    /// Create empty schemas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table.
    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Get a table by name.
    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// List all table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Parse and normalize JSON declarations.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, TableSchemaError> {
        let tables = json.as_object().ok_or(TableSchemaError::NotAnObject)?;

        let mut schemas = Self::new();
        for (name, declaration) in tables {
            schemas = schemas.with_table(parse_table(name, &Value::from(declaration))?);
        }
        Ok(schemas)
    }
}

fn parse_table(name: &str, declaration: &Value) -> Result<TableDef, TableSchemaError> {
    let invalid = |source: ValidationError| TableSchemaError::Invalid {
        table: name.to_string(),
        source,
    };

    validate(&table_model(), Some(declaration)).map_err(invalid)?;

    let columns = declaration
        .get("columns")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            invalid(
                ValidationError::mismatch(&Model::object().into(), declaration.get("columns"))
                    .under_key("columns"),
            )
        })?;

    let mut table = TableDef::new(name);
    for (column, notation) in columns {
        let def = match notation {
            Value::String(shorthand) => parse_shorthand(name, column, shorthand)?,
            Value::Object(_) => parse_detailed(name, column, notation)?,
            other => {
                return Err(invalid(
                    ValidationError::mismatch(&column_model(), Some(other))
                        .under_key(column)
                        .under_key("columns"),
                ))
            }
        };
        table = table.with_column(def);
    }

    for index in declaration
        .get("indexes")
        .and_then(Value::as_array)
        .unwrap_or_default()
    {
        let index_columns: Vec<String> = index
            .get("columns")
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        if let Some(unknown) = index_columns.iter().find(|c| table.get_column(c).is_none()) {
            return Err(TableSchemaError::UnknownIndexColumn {
                table: name.to_string(),
                column: unknown.clone(),
            });
        }
        let unique = index
            .get("unique")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        table = table.with_index(IndexDef::composite(index_columns, unique));
    }

    Ok(table)
}

/// Parse `type` or `type/length`.
fn parse_shorthand(
    table: &str,
    column: &str,
    notation: &str,
) -> Result<ColumnDef, TableSchemaError> {
    let (type_name, length) = match notation.split_once('/') {
        Some((type_name, length)) => {
            let length = length
                .trim()
                .parse::<u32>()
                .map_err(|_| TableSchemaError::InvalidShorthand {
                    table: table.to_string(),
                    column: column.to_string(),
                    notation: notation.to_string(),
                })?;
            (type_name.trim(), Some(length))
        }
        None => (notation.trim(), None),
    };

    let column_type = column_type(table, column, type_name)?;
    let mut def = ColumnDef::new(column, column_type);
    def.length = length;
    Ok(def)
}

fn parse_detailed(
    table: &str,
    column: &str,
    notation: &Value,
) -> Result<ColumnDef, TableSchemaError> {
    validate(&column_model(), Some(notation)).map_err(|e| TableSchemaError::Invalid {
        table: table.to_string(),
        source: e.under_key(column).under_key("columns"),
    })?;

    let type_name = notation
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut def = ColumnDef::new(column, column_type(table, column, type_name)?);

    if let Some(length) = notation.get("length").and_then(Value::as_f64) {
        if length < 0.0 || length > f64::from(u32::MAX) {
            return Err(TableSchemaError::InvalidLength {
                table: table.to_string(),
                column: column.to_string(),
                length,
            });
        }
        def.length = Some(length as u32);
    }
    def.unique = notation.get("unique").and_then(Value::as_bool).unwrap_or(false);
    def.nullable = notation.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    Ok(def)
}

fn column_type(table: &str, column: &str, name: &str) -> Result<ColumnType, TableSchemaError> {
    ColumnType::from_name(name).ok_or_else(|| TableSchemaError::UnknownColumnType {
        table: table.to_string(),
        column: column.to_string(),
        column_type: name.to_string(),
    })
}
