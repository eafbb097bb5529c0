//! Boot-time table checks.

use keyward_schema::{ColumnDef, ColumnType, TableDef, TableSchemas};

use crate::error::PreRequisiteError;
use crate::hash::{DIGEST_LEN, SALT_LEN};
use crate::options::AuthOptions;

/// Check that the user table can hold the credentials described by `options`.
pub fn check_tables(options: &AuthOptions, tables: &TableSchemas) -> Result<(), PreRequisiteError> {
    let table = tables
        .get(&options.user_table)
        .ok_or_else(|| PreRequisiteError::MissingTable(options.user_table.clone()))?;

    check_column(table, &options.login, ColumnType::String, 1)?;
    check_column(
        table,
        &options.password,
        ColumnType::Binary,
        DIGEST_LEN as u32,
    )?;
    if let Some(salt) = options.salt_column() {
        check_column(table, salt, ColumnType::Binary, SALT_LEN as u32)?;
    }

    if !table.has_unique_index(&options.login) {
        return Err(PreRequisiteError::NotUnique {
            table: table.name.clone(),
            column: options.login.clone(),
        });
    }
    Ok(())
}

fn check_column(
    table: &TableDef,
    name: &str,
    expected: ColumnType,
    min_length: u32,
) -> Result<(), PreRequisiteError> {
    let column = table
        .get_column(name)
        .ok_or_else(|| PreRequisiteError::MissingColumn {
            table: table.name.clone(),
            column: name.to_string(),
        })?;

    if column.satisfies(expected, min_length) {
        return Ok(());
    }
    Err(PreRequisiteError::ColumnMismatch {
        table: table.name.clone(),
        column: name.to_string(),
        expected,
        min_length,
        found: declared(column),
    })
}

fn declared(column: &ColumnDef) -> String {
    match column.length {
        Some(length) => format!("{}/{}", column.column_type, length),
        None => column.column_type.to_string(),
    }
}
