//! Keyward credential authentication.
//!
//! This crate provides the authentication plugin and the stage pipeline it
//! attaches to:
//!
//! - [`HashEngine`]: salted PBKDF2 password digests
//! - [`TokenService`]: EdDSA bearer tokens
//! - [`AuthPlugin`]: login, registration, and bearer checks
//! - [`Pipeline`]: runs plugins over requests against a [`DataQuery`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keyward_auth::{AuthPlugin, MemoryStore, Pipeline, Request, TokenService};
//! use keyward_schema::{TableSchemas, Value};
//!
//! let tables = TableSchemas::from_json(&serde_json::json!({
//!     "User": {
//!         "columns": {"email": "string/40", "password": "binary/64", "salt": "binary/16"},
//!         "indexes": [{"columns": ["email"], "unique": true}]
//!     }
//! }))?;
//!
//! let tokens = Arc::new(TokenService::generate()?);
//! let auth = AuthPlugin::configure(&Value::Null, tokens)?;
//!
//! let mut pipeline = Pipeline::new(Arc::new(MemoryStore::new(tables.clone())))
//!     .with_plugin(Arc::new(auth));
//! pipeline.boot(&tables)?;
//!
//! let body = serde_json::json!({"email": "a@b.com", "password": "secret"});
//! let response = pipeline.handle(Request::new(Value::from(body))).await;
//! ```

pub mod auth;
pub mod error;
pub mod hash;
pub mod options;
pub mod pipeline;
pub mod plugin;
pub mod query;
pub mod store;
pub mod token;

pub use auth::{AuthPlugin, RequestKind};
pub use error::{
    AuthError, BootError, ConfigError, HashError, PreRequisiteError, QueryError, TokenError,
};
pub use hash::HashEngine;
pub use options::AuthOptions;
pub use pipeline::Pipeline;
pub use plugin::{
    EntryError, HookContext, Outcome, PendingTokens, Plugin, Request, RequestState, Response,
};
pub use query::DataQuery;
pub use store::MemoryStore;
pub use token::{TokenClaims, TokenService};
