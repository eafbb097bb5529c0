//! Credential authentication plugin.
//!
//! Every request is classified by the middleware stage:
//!
//! - **Login**: top-level login and password values are checked against the
//!   stored digest. On success the request is rewritten into a read of the
//!   user record, which leaves the pipeline carrying a fresh token.
//! - **Registration**: a `create` sub-request on the user table. Passwords
//!   are replaced by salted digests before persistence, and every created
//!   record leaves the pipeline carrying a token.
//! - **Bearer**: an `Authorization: Bearer <token>` header. The token
//!   subject becomes the request identity.
//! - **Rejected**: anything else, answered with 401.
//!
//! User records never leave the pipeline with their password or salt
//! columns.

mod classify;
mod login;
mod prerequisite;
mod registration;

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use keyward_schema::{TableSchemas, Value};

pub use classify::{classify, RequestKind};
pub use prerequisite::check_tables;

use crate::error::{AuthError, ConfigError, PreRequisiteError, TokenError};
use crate::hash::HashEngine;
use crate::options::AuthOptions;
use crate::plugin::{HookContext, Outcome, Plugin, Request, RequestState, Response};
use crate::query::DataQuery;
use crate::store::ID_FIELD;
use crate::token::TokenService;

/// Plugin name.
pub const PLUGIN_NAME: &str = "auth";

/// Key under which tokens are attached to user records.
pub const TOKEN_FIELD: &str = "token";

/// Message sent with requests that carry no credentials.
pub const REJECTED_MESSAGE: &str = "request could not be authenticated";

/// Credential authentication plugin.
pub struct AuthPlugin {
    options: AuthOptions,
    tokens: Arc<TokenService>,
    hasher: HashEngine,
}

impl AuthPlugin {
    /// Read and validate `options`, then build the plugin.
    pub fn configure(options: &Value, tokens: Arc<TokenService>) -> Result<Self, ConfigError> {
        let options = AuthOptions::from_value(options)?;
        Ok(Self::with_options(options, tokens))
    }

    /// Build the plugin from options that were already validated.
    pub fn with_options(options: AuthOptions, tokens: Arc<TokenService>) -> Self {
        Self {
            options,
            tokens,
            hasher: HashEngine::new(),
        }
    }

    /// Active options.
    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    fn verify_bearer(&self, token: &str, state: &mut RequestState) -> Outcome {
        bearer_outcome(self.tokens.verify(token), state)
    }

    fn is_user_table(&self, table: &str) -> bool {
        table == self.options.user_table
    }
}

#[async_trait]
impl Plugin for AuthPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn tables(&self) -> Vec<String> {
        vec![self.options.user_table.clone()]
    }

    fn pre_requisite(&self, tables: &TableSchemas) -> Result<(), PreRequisiteError> {
        check_tables(&self.options, tables)
    }

    async fn middleware(
        &self,
        request: &mut Request,
        state: &mut RequestState,
        query: &dyn DataQuery,
    ) -> Outcome {
        let kind = classify(request, &self.options);
        tracing::debug!(kind = kind.as_str(), "request classified");

        match kind {
            RequestKind::Login => self.login(request, state, query).await.into(),
            RequestKind::Registration => Outcome::Continue,
            RequestKind::Bearer(token) => self.verify_bearer(&token, state),
            RequestKind::Rejected => {
                tracing::warn!("request carries no credentials");
                Outcome::Respond(Response::text(StatusCode::UNAUTHORIZED, REJECTED_MESSAGE))
            }
        }
    }

    async fn on_request(
        &self,
        table: &str,
        fragment: &mut Value,
        ctx: &mut HookContext<'_>,
    ) -> Outcome {
        if self.is_user_table(table) {
            self.register(table, fragment, ctx.state).await;
        }
        Outcome::Continue
    }

    async fn on_creation(
        &self,
        table: &str,
        record: &mut Value,
        _state: &mut RequestState,
    ) -> Outcome {
        if !self.is_user_table(table) {
            return Outcome::Continue;
        }
        let Some(id) = record.get(ID_FIELD).filter(|id| !id.is_null()) else {
            tracing::error!(table, "created user has no id");
            return Outcome::Fail(AuthError::Internal("created user has no id".into()));
        };
        let subject = describe(id);

        let token = match self.tokens.sign(&subject) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(user_id = %subject, error = %e, "failed to sign token");
                return Outcome::Fail(e.into());
            }
        };
        if let Some(fields) = record.as_object_mut() {
            fields.insert(TOKEN_FIELD.to_string(), Value::String(token));
        }

        tracing::info!(user_id = %subject, "user registered");
        Outcome::Continue
    }

    fn on_result(&self, table: &str, records: &mut [Value], state: &mut RequestState) {
        if !self.is_user_table(table) {
            return;
        }
        for record in records.iter_mut() {
            let token = record
                .get(ID_FIELD)
                .and_then(|id| state.pending_tokens.take(&describe(id)));

            let Some(fields) = record.as_object_mut() else {
                continue;
            };
            if let Some(token) = token {
                fields.insert(TOKEN_FIELD.to_string(), Value::String(token));
            }
            fields.remove(&self.options.password);
            if let Some(salt) = self.options.salt_column() {
                fields.remove(salt);
            }
        }
    }
}

fn bearer_outcome(verified: Result<String, TokenError>, state: &mut RequestState) -> Outcome {
    match verified {
        Ok(subject) => {
            tracing::debug!(user_id = %subject, "bearer token accepted");
            state.identity = Some(subject);
            Outcome::Continue
        }
        Err(e) => {
            let err = AuthError::from(e);
            if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(error = %err, "bearer token verification failed");
            } else {
                tracing::warn!(error = %err, "bearer token rejected");
            }
            Outcome::Fail(err)
        }
    }
}

/// Render a value for messages: strings bare, everything else as displayed.
fn describe(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
