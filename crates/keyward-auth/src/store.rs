//! In-memory [`DataQuery`] implementation.
//!
//! Enforces the unique columns declared in the table schemas and assigns
//! sequential string ids. Intended for embedding and tests, not as a
//! production query engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use keyward_schema::{Map, TableSchemas, Value};
use parking_lot::RwLock;

use crate::error::QueryError;
use crate::query::DataQuery;

/// Field holding the record id.
pub const ID_FIELD: &str = "id";

/// Table storage backed by process memory.
pub struct MemoryStore {
    schemas: TableSchemas,
    tables: RwLock<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store for the declared tables.
    pub fn new(schemas: TableSchemas) -> Self {
        let tables = schemas
            .table_names()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();

        Self {
            schemas,
            tables: RwLock::new(tables),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of every record in `table`.
    pub fn records(&self, table: &str) -> Vec<Value> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    fn check_unique(&self, table: &str, rows: &[Value], record: &Map) -> Result<(), QueryError> {
        let Some(def) = self.schemas.get(table) else {
            return Ok(());
        };

        for column in def.unique_columns() {
            let Some(value) = record.get(column) else {
                continue;
            };
            if rows.iter().any(|row| row.get(column) == Some(value)) {
                return Err(QueryError::UniqueViolation {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn matches(record: &Value, filter: &Map) -> bool {
    filter.iter().all(|(k, v)| record.get(k) == Some(v))
}

fn project(record: &Value, select: &[&str]) -> Value {
    if select.is_empty() {
        return record.clone();
    }
    let Some(map) = record.as_object() else {
        return record.clone();
    };
    Value::Object(
        select
            .iter()
            .filter_map(|field| map.get(*field).map(|v| (field.to_string(), v.clone())))
            .collect(),
    )
}

#[async_trait]
impl DataQuery for MemoryStore {
    async fn find(
        &self,
        table: &str,
        filter: &Map,
        select: &[&str],
    ) -> Result<Vec<Value>, QueryError> {
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| QueryError::UnknownTable(table.to_string()))?;

        Ok(rows
            .iter()
            .filter(|row| matches(row, filter))
            .map(|row| project(row, select))
            .collect())
    }

    async fn create(&self, table: &str, record: Value) -> Result<Value, QueryError> {
        let mut fields = match record {
            Value::Object(fields) => fields,
            other => {
                return Err(QueryError::InvalidRecord(format!(
                    "records must be objects, received {other}"
                )))
            }
        };

        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| QueryError::UnknownTable(table.to_string()))?;

        self.check_unique(table, rows, &fields)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let stored = Value::Object(fields);
        rows.push(stored.clone());
        tracing::debug!(table, id, "record created");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_schema::{ColumnDef, ColumnType, TableDef};
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new(
            TableSchemas::new().with_table(
                TableDef::new("User")
                    .with_column(
                        ColumnDef::new("email", ColumnType::String)
                            .with_length(40)
                            .with_unique(),
                    )
                    .with_column(ColumnDef::new("name", ColumnType::String).with_length(40)),
            ),
        )
    }

    fn filter(json: serde_json::Value) -> Map {
        match Value::from(json) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let store = store();
        let a = store
            .create("User", Value::from(json!({"email": "a@b.com"})))
            .await
            .unwrap();
        let b = store
            .create("User", Value::from(json!({"email": "c@d.com"})))
            .await
            .unwrap();

        assert_eq!(a.get(ID_FIELD).and_then(Value::as_str), Some("1"));
        assert_eq!(b.get(ID_FIELD).and_then(Value::as_str), Some("2"));
        assert_eq!(store.records("User").len(), 2);
    }

    #[tokio::test]
    async fn test_unique_violation() {
        let store = store();
        store
            .create(
                "User",
                Value::from(json!({"email": "a@b.com", "name": "x"})),
            )
            .await
            .unwrap();
        store
            .create(
                "User",
                Value::from(json!({"email": "z@b.com", "name": "x"})),
            )
            .await
            .unwrap();

        let err = store
            .create("User", Value::from(json!({"email": "a@b.com"})))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UniqueViolation { column, .. } if column == "email"));
    }

    #[tokio::test]
    async fn test_find_filters_and_projects() {
        let store = store();
        store
            .create(
                "User",
                Value::from(json!({"email": "a@b.com", "name": "Ann"})),
            )
            .await
            .unwrap();
        store
            .create(
                "User",
                Value::from(json!({"email": "c@d.com", "name": "Cy"})),
            )
            .await
            .unwrap();

        let found = store
            .find(
                "User",
                &filter(json!({"email": "c@d.com"})),
                &["id", "name"],
            )
            .await
            .unwrap();
        assert_eq!(found, vec![Value::from(json!({"id": "2", "name": "Cy"}))]);

        let all = store.find("User", &Map::new(), &[]).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_table_and_bad_record() {
        let store = store();
        assert!(matches!(
            store.find("Post", &Map::new(), &[]).await,
            Err(QueryError::UnknownTable(_))
        ));
        assert!(matches!(
            store.create("User", Value::from(json!(["x"]))).await,
            Err(QueryError::InvalidRecord(_))
        ));
    }
}
