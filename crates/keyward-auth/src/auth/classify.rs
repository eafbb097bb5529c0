//! Request classification.

use keyward_schema::Value;

use crate::options::AuthOptions;
use crate::plugin::{Request, CREATE_KEY};

/// What an incoming request is trying to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Credentials at the top level of the body.
    Login,
    /// Creation of one or more user records.
    Registration,
    /// Bearer token in the `Authorization` header.
    Bearer(String),
    /// Nothing to authenticate with.
    Rejected,
}

impl RequestKind {
    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Login => "login",
            RequestKind::Registration => "registration",
            RequestKind::Bearer(_) => "bearer",
            RequestKind::Rejected => "rejected",
        }
    }
}

/// Classify `request`. The first matching rule wins:
///
/// 1. login and password values present, not a user creation
///
/// Falsy credential values count as absent.
/// 2. user creation (single object or batch)
/// 3. bearer token
/// 4. rejected
pub fn classify(request: &Request, options: &AuthOptions) -> RequestKind {
    let registration = is_registration(&request.body, options);

    let credentials = has_value(request, &options.login) && has_value(request, &options.password);
    if !registration && credentials {
        return RequestKind::Login;
    }
    if registration {
        return RequestKind::Registration;
    }
    match request.bearer_token() {
        Some(token) => RequestKind::Bearer(token.to_string()),
        None => RequestKind::Rejected,
    }
}

fn has_value(request: &Request, field: &str) -> bool {
    request.field(field).is_some_and(|v| !v.is_falsy())
}

fn is_registration(body: &Value, options: &AuthOptions) -> bool {
    body.get(&options.user_table)
        .and_then(|fragment| fragment.get(CREATE_KEY))
        .is_some_and(|create| matches!(create, Value::Object(_) | Value::Array(_)))
}
