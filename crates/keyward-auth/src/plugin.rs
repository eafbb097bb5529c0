//! Plugin contract consumed by the [`Pipeline`](crate::pipeline::Pipeline).
//!
//! A request flows through explicit stages. Each stage returns an
//! [`Outcome`]; the pipeline halts at the first outcome that is not
//! [`Outcome::Continue`].
//!
//! ```text
//! middleware ─▶ on_request[table] ─▶ persist ─▶ on_creation[table] ─▶ on_result[table]
//! ```

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use http::StatusCode;
use keyward_schema::{Map, TableSchemas, Value};

use crate::error::{AuthError, PreRequisiteError};
use crate::query::DataQuery;

/// Key of the creation sub-request in a table fragment.
pub const CREATE_KEY: &str = "create";

/// Key of the filter sub-request in a table fragment.
pub const WHERE_KEY: &str = "where";

/// An incoming request: headers plus a JSON-shaped body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    headers: BTreeMap<String, String>,
    /// Request body. Top-level keys name tables or carry credentials.
    pub body: Value,
}

impl Request {
    /// Create a request with no headers.
    pub fn new(body: impl Into<Value>) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Add a header. Names are case-insensitive.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Token from an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("authorization")?.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    /// Body field lookup.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }
}

/// A response: status plus body. Error bodies are plain-text strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response body.
    pub body: Value,
}

impl Response {
    /// 200 with a body.
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Status with a plain-text message.
    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Value::String(message.into()),
        }
    }

    /// Message of a plain-text body.
    pub fn message(&self) -> Option<&str> {
        self.body.as_str()
    }
}

impl From<&AuthError> for Response {
    fn from(err: &AuthError) -> Self {
        Response::text(err.status(), err.to_string())
    }
}

/// Result of a pipeline stage.
#[derive(Debug)]
pub enum Outcome {
    /// Proceed to the next stage.
    Continue,
    /// Stop and send this response.
    Respond(Response),
    /// Stop with an error.
    Fail(AuthError),
}

impl Outcome {
    /// Check if the pipeline may proceed.
    pub fn is_continue(&self) -> bool {
        matches!(self, Outcome::Continue)
    }
}

impl From<Result<(), AuthError>> for Outcome {
    fn from(result: Result<(), AuthError>) -> Self {
        match result {
            Ok(()) => Outcome::Continue,
            Err(e) => Outcome::Fail(e),
        }
    }
}

/// Tokens minted during a request, waiting for result emission.
///
/// Each entry is read at most once: [`take`](Self::take) removes it.
#[derive(Debug, Default)]
pub struct PendingTokens {
    tokens: HashMap<String, String>,
}

impl PendingTokens {
    /// Stash a token for `record_id`.
    pub fn insert(&mut self, record_id: impl Into<String>, token: String) {
        self.tokens.insert(record_id.into(), token);
    }

    /// Remove and return the token for `record_id`.
    pub fn take(&mut self, record_id: &str) -> Option<String> {
        self.tokens.remove(record_id)
    }

    /// Number of tokens not yet emitted.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A batch entry that failed while siblings went ahead.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryError {
    /// Table of the batch.
    pub table: String,
    /// Index of the entry in the original batch.
    pub index: usize,
    /// Status the entry failed with.
    pub status: StatusCode,
    /// Plain-text reason.
    pub message: String,
}

impl EntryError {
    /// Record `err` against entry `index` of `table`.
    pub fn new(table: impl Into<String>, index: usize, err: &AuthError) -> Self {
        Self {
            table: table.into(),
            index,
            status: err.status(),
            message: err.to_string(),
        }
    }

    /// Wire form: `{ table, index, status, message }`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("table".into(), self.table.clone().into());
        map.insert("index".into(), Value::Int(self.index as i64));
        map.insert("status".into(), Value::Int(i64::from(self.status.as_u16())));
        map.insert("message".into(), self.message.clone().into());
        Value::Object(map)
    }
}

/// State owned by a single request.
///
/// Dropped with the request, so nothing stashed here can reach another
/// request's response.
#[derive(Debug, Default)]
pub struct RequestState {
    /// Authenticated subject id.
    pub identity: Option<String>,
    /// Tokens waiting for result emission.
    pub pending_tokens: PendingTokens,
    /// Per-entry batch failures.
    pub entry_errors: Vec<EntryError>,
    /// Free-form values stashed by plugins.
    pub values: Map,
}

impl RequestState {
    /// Stash a value under `key`.
    pub fn update(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }
}

/// Capabilities handed to request hooks.
pub struct HookContext<'a> {
    /// Nested reads and writes through the query collaborator.
    pub query: &'a dyn DataQuery,
    /// Per-request state.
    pub state: &'a mut RequestState,
}

/// A plugin attached to the pipeline.
///
/// Hooks default to no-ops so plugins only implement the stages they use.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name, used in logs and boot errors.
    fn name(&self) -> &str;

    /// Tables whose hooks this plugin wants to receive.
    fn tables(&self) -> Vec<String>;

    /// Boot-time check against the host's declared tables.
    fn pre_requisite(&self, tables: &TableSchemas) -> Result<(), PreRequisiteError>;

    /// First stage: may rewrite the request.
    async fn middleware(
        &self,
        request: &mut Request,
        state: &mut RequestState,
        query: &dyn DataQuery,
    ) -> Outcome;

    /// Per-table transform of a request fragment.
    async fn on_request(
        &self,
        _table: &str,
        _fragment: &mut Value,
        _ctx: &mut HookContext<'_>,
    ) -> Outcome {
        Outcome::Continue
    }

    /// Enrich a newly created record.
    async fn on_creation(
        &self,
        _table: &str,
        _record: &mut Value,
        _state: &mut RequestState,
    ) -> Outcome {
        Outcome::Continue
    }

    /// Enrich or redact records before they leave the pipeline.
    fn on_result(&self, _table: &str, _records: &mut [Value], _state: &mut RequestState) {}
}
