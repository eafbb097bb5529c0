//! Credential login.

use keyward_schema::{Map, Value};

use super::{describe, AuthPlugin};
use crate::error::AuthError;
use crate::hash::HashEngine;
use crate::plugin::{Request, RequestState, WHERE_KEY};
use crate::query::DataQuery;
use crate::store::ID_FIELD;

impl AuthPlugin {
    /// Check the credentials in `request` and rewrite it into a read of the
    /// authenticated user record.
    pub(super) async fn login(
        &self,
        request: &mut Request,
        state: &mut RequestState,
        query: &dyn DataQuery,
    ) -> Result<(), AuthError> {
        let options = &self.options;
        let body = request
            .body
            .as_object_mut()
            .ok_or_else(|| AuthError::BadRequest("request body must be an object".into()))?;

        let login = body.get(&options.login).cloned().unwrap_or(Value::Null);
        let password = match body.get(&options.password) {
            Some(Value::String(password)) => password.clone(),
            _ => {
                return Err(AuthError::BadRequest(format!(
                    "{} must be a string",
                    options.password
                )))
            }
        };

        let mut filter = Map::new();
        filter.insert(options.login.clone(), login.clone());

        let mut select = vec![ID_FIELD, options.password.as_str()];
        select.extend(options.salt_column());

        let mut users = query.find(&options.user_table, &filter, &select).await?;
        let user = match users.len() {
            0 => {
                tracing::warn!(login = %describe(&login), "login for unknown user");
                return Err(AuthError::NotFound(describe(&login)));
            }
            1 => users.remove(0),
            n => {
                tracing::error!(
                    table = %options.user_table,
                    login = %describe(&login),
                    matches = n,
                    "login column is not unique"
                );
                return Err(AuthError::Internal(format!(
                    "{n} users share the login {}",
                    describe(&login)
                )));
            }
        };

        let stored = user
            .get(&options.password)
            .and_then(Value::as_bytes)
            .ok_or_else(|| AuthError::Internal("stored password is not binary".into()))?;
        let salt = options
            .salt_column()
            .and_then(|column| user.get(column))
            .and_then(Value::as_bytes)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        let digest = HashEngine::derive_digest_async(password, salt).await?;
        if !HashEngine::digests_equal(&digest, stored) {
            tracing::warn!(login = %describe(&login), "wrong password");
            return Err(AuthError::WrongPassword(describe(&login)));
        }

        let id = user
            .get(ID_FIELD)
            .cloned()
            .filter(|id| !id.is_null())
            .ok_or_else(|| AuthError::Internal("user record has no id".into()))?;
        let subject = describe(&id);
        let token = self.tokens.sign(&subject)?;

        body.remove(&options.login);
        body.remove(&options.password);

        let mut by_id = Map::new();
        by_id.insert(ID_FIELD.to_string(), id);
        let mut read = Map::new();
        read.insert(WHERE_KEY.to_string(), Value::Object(by_id));
        body.insert(options.user_table.clone(), Value::Object(read));

        state.pending_tokens.insert(subject.clone(), token);
        state.identity = Some(subject.clone());

        tracing::info!(user_id = %subject, "login succeeded");
        Ok(())
    }
}
