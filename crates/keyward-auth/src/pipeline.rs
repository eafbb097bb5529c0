//! Stage sequencer driving plugins over a request.
//!
//! A request body is an object. Every object-valued key naming a declared
//! table is a table fragment:
//!
//! ```json
//! { "User": { "create": { "email": "a@b.com" } }, "Post": { "where": { "id": "1" } } }
//! ```
//!
//! A fragment with `create` persists each entry. Otherwise it is read with
//! its `where` filter, or with no filter when absent. Keys whose value is not
//! an object are left to the middleware stage.
//!
//! The response body maps each table to its records. Entries that failed
//! while their siblings went ahead are listed under `errors`. When nothing
//! but failures came out of a request, the first failure becomes the
//! response.

use std::collections::BTreeSet;
use std::sync::Arc;

use http::StatusCode;
use keyward_schema::{Map, TableSchemas, Value};

use crate::error::{AuthError, BootError, QueryError};
use crate::plugin::{
    EntryError, HookContext, Outcome, Plugin, Request, RequestState, Response, CREATE_KEY,
    WHERE_KEY,
};
use crate::query::DataQuery;

/// Key listing failed batch entries in a response body.
pub const ERRORS_KEY: &str = "errors";

/// Why a request stopped early.
#[derive(Debug)]
enum Halt {
    Respond(Response),
    Fail(AuthError),
    Query(QueryError),
}

impl From<QueryError> for Halt {
    fn from(err: QueryError) -> Self {
        Halt::Query(err)
    }
}

impl Halt {
    fn into_response(self) -> Response {
        match self {
            Halt::Respond(response) => response,
            Halt::Fail(err) => Response::from(&err),
            Halt::Query(err) => Response::text(err.status(), err.to_string()),
        }
    }
}

fn check(outcome: Outcome) -> Result<(), Halt> {
    match outcome {
        Outcome::Continue => Ok(()),
        Outcome::Respond(response) => Err(Halt::Respond(response)),
        Outcome::Fail(err) => Err(Halt::Fail(err)),
    }
}

/// Runs plugins over requests against a data-query collaborator.
pub struct Pipeline {
    query: Arc<dyn DataQuery>,
    plugins: Vec<Arc<dyn Plugin>>,
    tables: Option<TableSchemas>,
}

impl Pipeline {
    /// Create a pipeline with no plugins.
    pub fn new(query: Arc<dyn DataQuery>) -> Self {
        Self {
            query,
            plugins: Vec::new(),
            tables: None,
        }
    }

    /// Attach a plugin. Plugins run in the order they are attached.
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Check every plugin against the declared tables and start serving.
    ///
    /// A failed check leaves the pipeline unbooted.
    pub fn boot(&mut self, tables: &TableSchemas) -> Result<(), BootError> {
        for plugin in &self.plugins {
            if let Err(source) = plugin.pre_requisite(tables) {
                tracing::error!(
                    plugin = plugin.name(),
                    error = %source,
                    "plugin activation refused"
                );
                return Err(BootError {
                    plugin: plugin.name().to_string(),
                    source,
                });
            }
            tracing::info!(plugin = plugin.name(), "plugin activated");
        }

        self.tables = Some(tables.clone());
        Ok(())
    }

    /// Check if the pipeline accepts requests.
    pub fn is_booted(&self) -> bool {
        self.tables.is_some()
    }

    /// Run a request through every stage.
    pub async fn handle(&self, request: Request) -> Response {
        let Some(tables) = &self.tables else {
            return Response::text(
                StatusCode::SERVICE_UNAVAILABLE,
                "pipeline has not been booted",
            );
        };

        let mut state = RequestState::default();
        match self.handle_inner(tables, request, &mut state).await {
            Ok(response) => response,
            Err(halt) => {
                tracing::debug!(?halt, "request halted");
                halt.into_response()
            }
        }
    }

    async fn handle_inner(
        &self,
        tables: &TableSchemas,
        mut request: Request,
        state: &mut RequestState,
    ) -> Result<Response, Halt> {
        for plugin in &self.plugins {
            check(plugin.middleware(&mut request, state, self.query.as_ref()).await)?;
        }

        let Value::Object(body) = request.body else {
            return Err(Halt::Fail(AuthError::BadRequest(
                "request body must be an object".into(),
            )));
        };

        let mut results = Map::new();
        for (table, mut fragment) in body {
            if !matches!(fragment, Value::Object(_)) {
                continue;
            }
            if tables.get(&table).is_none() {
                return Err(QueryError::UnknownTable(table).into());
            }

            let hooked: Vec<&Arc<dyn Plugin>> = self
                .plugins
                .iter()
                .filter(|plugin| plugin.tables().contains(&table))
                .collect();

            for plugin in &hooked {
                let mut ctx = HookContext {
                    query: self.query.as_ref(),
                    state: &mut *state,
                };
                check(plugin.on_request(&table, &mut fragment, &mut ctx).await)?;
            }

            let mut records = self.execute(&table, fragment, &hooked, state).await?;

            for plugin in &hooked {
                plugin.on_result(&table, &mut records, state);
            }
            results.insert(table, Value::Array(records));
        }

        Ok(build_response(results, state))
    }

    async fn execute(
        &self,
        table: &str,
        fragment: Value,
        hooked: &[&Arc<dyn Plugin>],
        state: &mut RequestState,
    ) -> Result<Vec<Value>, Halt> {
        let mut fields = match fragment {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        if let Some(create) = fields.remove(CREATE_KEY) {
            return self.create_all(table, create, hooked, state).await;
        }

        let filter = match fields.remove(WHERE_KEY) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(filter)) => filter,
            Some(_) => {
                return Err(Halt::Fail(AuthError::BadRequest(format!(
                    "`{WHERE_KEY}` on {table} must be an object"
                ))))
            }
        };
        Ok(self.query.find(table, &filter, &[]).await?)
    }

    async fn create_all(
        &self,
        table: &str,
        create: Value,
        hooked: &[&Arc<dyn Plugin>],
        state: &mut RequestState,
    ) -> Result<Vec<Value>, Halt> {
        let entries = match create {
            Value::Array(entries) => entries,
            entry => vec![entry],
        };

        // Entries dropped by request hooks keep their original index.
        let dropped: BTreeSet<usize> = state
            .entry_errors
            .iter()
            .filter(|e| e.table == table)
            .map(|e| e.index)
            .collect();
        let indices = (0..).filter(|i| !dropped.contains(i));

        let mut created = Vec::with_capacity(entries.len());
        for (entry, index) in entries.into_iter().zip(indices) {
            let mut record = match self.query.create(table, entry).await {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(table, index, error = %err, "record creation failed");
                    state.entry_errors.push(EntryError {
                        table: table.to_string(),
                        index,
                        status: err.status(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            for plugin in hooked {
                check(plugin.on_creation(table, &mut record, state).await)?;
            }
            created.push(record);
        }
        Ok(created)
    }
}

fn build_response(mut results: Map, state: &mut RequestState) -> Response {
    if state.entry_errors.is_empty() {
        return Response::ok(Value::Object(results));
    }

    state
        .entry_errors
        .sort_by(|a, b| a.table.cmp(&b.table).then(a.index.cmp(&b.index)));

    let produced = results
        .values()
        .filter_map(Value::as_array)
        .any(|records| !records.is_empty());
    if !produced {
        let first = &state.entry_errors[0];
        return Response::text(first.status, first.message.clone());
    }

    let errors = state.entry_errors.iter().map(EntryError::to_value).collect();
    results.insert(ERRORS_KEY.to_string(), Value::Array(errors));
    Response::ok(Value::Object(results))
}
