//! User registration.
//!
//! Every entry of a creation batch is hashed concurrently. An entry that
//! fails is dropped from the batch and reported on its own; the others go
//! ahead. Nothing is rolled back.

use futures::future::join_all;
use keyward_schema::{Map, Value};

use super::AuthPlugin;
use crate::error::AuthError;
use crate::hash::HashEngine;
use crate::plugin::{EntryError, RequestState, CREATE_KEY};

impl AuthPlugin {
    /// Replace plaintext passwords in the `create` sub-request of `fragment`
    /// with salted digests.
    pub(super) async fn register(
        &self,
        table: &str,
        fragment: &mut Value,
        state: &mut RequestState,
    ) {
        let Some(fields) = fragment.as_object_mut() else {
            return;
        };
        let Some(create) = fields.remove(CREATE_KEY) else {
            return;
        };

        let (entries, single) = match create {
            Value::Array(entries) => (entries, false),
            entry => (vec![entry], true),
        };
        let total = entries.len();

        let prepared = join_all(
            entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| async move { (index, self.prepare_entry(entry).await) }),
        )
        .await;

        let mut accepted = Vec::with_capacity(total);
        for (index, result) in prepared {
            match result {
                Ok(entry) => accepted.push(entry),
                Err(err) => {
                    tracing::warn!(table, index, error = %err, "user creation entry rejected");
                    state.entry_errors.push(EntryError::new(table, index, &err));
                }
            }
        }
        tracing::debug!(
            table,
            total,
            accepted = accepted.len(),
            "user creation batch hashed"
        );

        // A failed single entry leaves an empty batch so the fragment is not
        // read back as a plain query.
        let create = if single {
            accepted.pop().unwrap_or_else(|| Value::Array(Vec::new()))
        } else {
            Value::Array(accepted)
        };
        fields.insert(CREATE_KEY.to_string(), create);
    }

    async fn prepare_entry(&self, entry: Value) -> Result<Value, AuthError> {
        let options = &self.options;
        let Value::Object(mut fields) = entry else {
            return Err(AuthError::BadRequest(
                "user creation entry must be an object".into(),
            ));
        };

        required_string(&fields, &options.login)?;
        let password = required_string(&fields, &options.password)?.to_string();

        let salt = match options.salt_column() {
            Some(_) => self.hasher.generate_salt()?.to_vec(),
            None => Vec::new(),
        };
        let digest = HashEngine::derive_digest_async(password, salt.clone()).await?;

        fields.insert(options.password.clone(), Value::Bytes(digest.to_vec()));
        if let Some(column) = options.salt_column() {
            fields.insert(column.to_string(), Value::Bytes(salt));
        }
        Ok(Value::Object(fields))
    }
}

fn required_string<'a>(fields: &'a Map, column: &str) -> Result<&'a str, AuthError> {
    match fields.get(column) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value),
        None | Some(Value::Null) | Some(Value::String(_)) => Err(AuthError::BadRequest(
            format!("Missing {column} in user creation"),
        )),
        Some(_) => Err(AuthError::BadRequest(format!("{column} must be a string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(json: serde_json::Value) -> Map {
        match Value::from(json) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_required_string() {
        let entry = fields(json!({"email": "a@b.com", "password": 5, "name": null}));
        assert_eq!(required_string(&entry, "email").unwrap(), "a@b.com");
        assert_eq!(
            required_string(&entry, "password").unwrap_err().to_string(),
            "password must be a string"
        );
        assert_eq!(
            required_string(&entry, "name").unwrap_err().to_string(),
            "Missing name in user creation"
        );
        assert_eq!(
            required_string(&entry, "salt").unwrap_err().to_string(),
            "Missing salt in user creation"
        );
    }

    #[test]
    fn test_empty_string_is_missing() {
        let entry = fields(json!({"email": "", "password": "secret"}));
        assert_eq!(
            required_string(&entry, "email").unwrap_err().to_string(),
            "Missing email in user creation"
        );
        assert_eq!(required_string(&entry, "password").unwrap(), "secret");
    }
}
