//! Data-query collaborator seam.
//!
//! The surrounding query engine owns persistence. Plugins reach it only
//! through this trait.

use async_trait::async_trait;
use keyward_schema::{Map, Value};

use crate::error::QueryError;

/// Reads and writes records on behalf of plugins and the pipeline.
#[async_trait]
pub trait DataQuery: Send + Sync {
    /// Find records whose fields equal every entry of `filter`.
    ///
    /// When `select` is non-empty only those fields are returned.
    async fn find(
        &self,
        table: &str,
        filter: &Map,
        select: &[&str],
    ) -> Result<Vec<Value>, QueryError>;

    /// Insert a record and return it with its assigned `id`.
    async fn create(&self, table: &str, record: Value) -> Result<Value, QueryError>;
}
