//! Auth plugin options.
//!
//! Options arrive as a dynamic value, are merged over the defaults, checked
//! against [`AuthOptions::model`], and only then read into the typed struct.

use keyward_schema::{validate, Map, Model, Value};
use serde::Deserialize;

use crate::error::ConfigError;

/// Default login column.
pub const DEFAULT_LOGIN: &str = "email";
/// Default password column.
pub const DEFAULT_PASSWORD: &str = "password";
/// Default salt column.
pub const DEFAULT_SALT: &str = "salt";
/// Default user table.
pub const DEFAULT_USER_TABLE: &str = "User";

/// Validated auth plugin options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOptions {
    /// Column holding the login value.
    pub login: String,
    /// Column holding the password digest.
    pub password: String,
    /// Column holding the salt; `None` disables salting.
    pub salt: Option<String>,
    /// Table holding user records.
    pub user_table: String,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            salt: Some(DEFAULT_SALT.to_string()),
            user_table: DEFAULT_USER_TABLE.to_string(),
        }
    }
}

impl AuthOptions {
    /// Schema every options object must satisfy after defaults are merged.
    pub fn model() -> Model {
        Model::object()
            .required_field("login", Model::string())
            .required_field("password", Model::string())
            .field("salt", Model::any())
            .required_field("userTable", Model::string())
            .strict()
            .into()
    }

    /// Read options, filling in defaults for absent keys.
    ///
    /// `null` stands for "no options". A falsy `salt` disables salting.
    pub fn from_value(options: &Value) -> Result<Self, ConfigError> {
        let mut merged = Map::new();
        merged.insert("login".into(), DEFAULT_LOGIN.into());
        merged.insert("password".into(), DEFAULT_PASSWORD.into());
        merged.insert("salt".into(), DEFAULT_SALT.into());
        merged.insert("userTable".into(), DEFAULT_USER_TABLE.into());

        let merged = match options {
            Value::Null => Value::Object(merged),
            Value::Object(provided) => {
                merged.extend(provided.iter().map(|(k, v)| (k.clone(), v.clone())));
                Value::Object(merged)
            }
            other => other.clone(),
        };

        validate(&Self::model(), Some(&merged))?;

        let mut json = merged.to_json();
        if let Some(salt) = merged.get("salt") {
            if salt.is_falsy() {
                json["salt"] = serde_json::Value::Null;
            } else if salt.as_str().is_none() {
                return Err(ConfigError::InvalidSalt);
            }
        }

        let options: AuthOptions = serde_json::from_value(json)?;
        options.check()?;
        Ok(options)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.login.is_empty() {
            return Err(ConfigError::Empty("login"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Empty("password"));
        }
        if self.user_table.is_empty() {
            return Err(ConfigError::Empty("userTable"));
        }
        if self.login == self.password {
            return Err(ConfigError::SameColumn("login", "password"));
        }
        if let Some(salt) = &self.salt {
            if *salt == self.login {
                return Err(ConfigError::SameColumn("login", "salt"));
            }
            if *salt == self.password {
                return Err(ConfigError::SameColumn("password", "salt"));
            }
        }
        Ok(())
    }

    /// Salt column, when salting is enabled.
    pub fn salt_column(&self) -> Option<&str> {
        self.salt.as_deref()
    }
}
