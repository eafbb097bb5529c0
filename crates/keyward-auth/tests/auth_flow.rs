//! Integration tests for the authentication flow.

use std::sync::Arc;

use http::StatusCode;
use keyward_auth::{
    AuthPlugin, MemoryStore, Pipeline, PreRequisiteError, Request, Response, TokenService,
};
use keyward_schema::{TableSchemas, Value};
use serde_json::json;
use tracing_subscriber::EnvFilter;

struct TestContext {
    store: Arc<MemoryStore>,
    tokens: Arc<TokenService>,
    pipeline: Pipeline,
}

impl TestContext {
    fn new() -> Self {
        Self::with_options(json!({
            "login": "email",
            "password": "password",
            "salt": "salt",
            "userTable": "User"
        }))
    }

    fn with_options(options: serde_json::Value) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let tables = blog_tables();
        let store = Arc::new(MemoryStore::new(tables.clone()));
        let tokens = Arc::new(TokenService::generate().unwrap());
        let auth = AuthPlugin::configure(&Value::from(options), tokens.clone()).unwrap();

        let mut pipeline = Pipeline::new(store.clone()).with_plugin(Arc::new(auth));
        pipeline.boot(&tables).unwrap();

        Self {
            store,
            tokens,
            pipeline,
        }
    }

    async fn send(&self, body: serde_json::Value) -> Response {
        self.pipeline.handle(Request::new(Value::from(body))).await
    }

    async fn send_with_token(&self, token: &str, body: serde_json::Value) -> Response {
        let request = Request::new(Value::from(body))
            .with_header("Authorization", format!("Bearer {token}"));
        self.pipeline.handle(request).await
    }

    async fn register(&self, email: &str, password: &str) -> Response {
        self.send(json!({"User": {"create": {"email": email, "password": password}}}))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Response {
        self.send(json!({"email": email, "password": password})).await
    }
}

fn blog_tables() -> TableSchemas {
    TableSchemas::from_json(&json!({
        "User": {
            "columns": {
                "email": "string/40",
                "password": {"type": "binary", "length": 64},
                "salt": "binary/16",
                "name": "string/80"
            },
            "indexes": [{"columns": ["email"], "unique": true}]
        },
        "Post": {
            "columns": {"title": "string/120"}
        }
    }))
    .unwrap()
}

/// Records returned for `table` in a successful response.
fn records<'a>(response: &'a Response, table: &str) -> &'a [Value] {
    response
        .body
        .get(table)
        .and_then(Value::as_array)
        .unwrap_or_default()
}

fn token_of(record: &Value) -> &str {
    record
        .get("token")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

#[tokio::test]
async fn test_registration_stores_digest_and_salt() {
    let ctx = TestContext::new();

    let response = ctx.register("a@b.com", "secret").await;
    assert_eq!(response.status, StatusCode::OK);

    let stored = ctx.store.records("User");
    assert_eq!(stored.len(), 1);
    let password = stored[0].get("password").unwrap();
    assert_eq!(password.as_bytes().map(<[u8]>::len), Some(64));
    assert_ne!(password, &Value::from("secret"));
    let salt = stored[0].get("salt").and_then(Value::as_bytes);
    assert_eq!(salt.map(<[u8]>::len), Some(16));

    let created = records(&response, "User");
    assert_eq!(created.len(), 1);
    assert!(created[0].get("password").is_none());
    assert!(created[0].get("salt").is_none());
    assert_eq!(
        created[0].get("email").and_then(Value::as_str),
        Some("a@b.com")
    );
    assert_eq!(ctx.tokens.verify(token_of(&created[0])).unwrap(), "1");
}

#[tokio::test]
async fn test_login_issues_token() {
    let ctx = TestContext::new();
    ctx.register("a@b.com", "secret").await;

    let response = ctx.login("a@b.com", "secret").await;
    assert_eq!(response.status, StatusCode::OK);

    let users = records(&response, "User");
    assert_eq!(users.len(), 1);
    assert!(!token_of(&users[0]).is_empty());
    assert_eq!(ctx.tokens.verify(token_of(&users[0])).unwrap(), "1");
    assert!(users[0].get("password").is_none());
    assert!(users[0].get("salt").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::new();
    ctx.register("a@b.com", "secret").await;

    let response = ctx.login("a@b.com", "wrong").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.message(),
        Some("Wrong password provided for user a@b.com")
    );
}

#[tokio::test]
async fn test_login_for_unknown_user() {
    let ctx = TestContext::new();
    ctx.register("a@b.com", "secret").await;

    let response = ctx.login("z@b.com", "secret").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), Some("No user found for z@b.com"));
}

#[tokio::test]
async fn test_login_with_non_string_password() {
    let ctx = TestContext::new();
    ctx.register("a@b.com", "secret").await;

    let response = ctx.send(json!({"email": "a@b.com", "password": 42})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("password must be a string"));
}

#[tokio::test]
async fn test_batch_registration_rejects_only_bad_entry() {
    let ctx = TestContext::new();

    let response = ctx
        .send(json!({"User": {"create": [
            {"email": "a@b.com", "password": "secret"},
            {"email": "b@b.com"},
            {"email": "c@b.com", "password": "hunter2"}
        ]}}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let created = records(&response, "User");
    let emails: Vec<&str> = created
        .iter()
        .filter_map(|u| u.get("email").and_then(Value::as_str))
        .collect();
    assert_eq!(emails, vec!["a@b.com", "c@b.com"]);
    assert!(created.iter().all(|u| !token_of(u).is_empty()));

    let errors = response
        .body
        .get("errors")
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        Value::from(json!({
            "table": "User",
            "index": 1,
            "status": 400,
            "message": "Missing password in user creation"
        }))
    );

    assert_eq!(ctx.store.records("User").len(), 2);
    assert_eq!(ctx.login("c@b.com", "hunter2").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_registration_failures() {
    let ctx = TestContext::new();

    let response = ctx.send(json!({"User": {"create": {"email": "a@b.com"}}})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        Some("Missing password in user creation")
    );

    let response = ctx
        .send(json!({"User": {"create": {"email": ["a@b.com"], "password": "secret"}}}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("email must be a string"));

    assert!(ctx.store.records("User").is_empty());

    ctx.register("a@b.com", "secret").await;
    let response = ctx.register("a@b.com", "other").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(ctx.store.records("User").len(), 1);
}

#[tokio::test]
async fn test_bearer_token_grants_access() {
    let ctx = TestContext::new();
    let registered = ctx.register("a@b.com", "secret").await;
    let token = token_of(&records(&registered, "User")[0]).to_string();

    let response = ctx
        .send_with_token(&token, json!({"Post": {"create": {"title": "hello"}}}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(records(&response, "Post").len(), 1);

    let response = ctx
        .send_with_token(&token, json!({"User": {"where": {"email": "a@b.com"}}}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let users = records(&response, "User");
    assert_eq!(users.len(), 1);
    assert!(users[0].get("password").is_none());
    assert!(users[0].get("token").is_none());
}

#[tokio::test]
async fn test_bearer_token_from_another_key_pair() {
    let ctx = TestContext::new();
    let foreign = TokenService::generate().unwrap().sign("1").unwrap();

    let response = ctx.send_with_token(&foreign, json!({"Post": {"where": {}}})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let message = response.message().unwrap_or_default();
    assert!(message.starts_with("invalid token"));

    let response = ctx.send_with_token("garbage", json!({"Post": {"where": {}}})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_without_credentials_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx.send(json!({"Post": {"where": {}}})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.message(),
        Some("request could not be authenticated")
    );

    let response = ctx.send(json!({"Post": {"create": {"title": "x"}}})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(ctx.store.records("Post").is_empty());

    let response = ctx.login("", "").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.message(),
        Some("request could not be authenticated")
    );
}

#[tokio::test]
async fn test_registration_with_empty_credentials() {
    let ctx = TestContext::new();

    let response = ctx.register("a@b.com", "").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        Some("Missing password in user creation")
    );

    let response = ctx.register("", "secret").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("Missing email in user creation"));

    assert!(ctx.store.records("User").is_empty());
}

#[tokio::test]
async fn test_login_without_salt_column() {
    let ctx = TestContext::with_options(json!({"salt": false}));
    ctx.register("a@b.com", "secret").await;

    let stored = ctx.store.records("User");
    assert!(stored[0].get("salt").is_none());

    assert_eq!(ctx.login("a@b.com", "secret").await.status, StatusCode::OK);
    assert_eq!(
        ctx.login("a@b.com", "wrong").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_tokens_do_not_leak_between_requests() {
    let ctx = TestContext::new();
    ctx.register("a@b.com", "secret").await;

    let first = ctx.login("a@b.com", "secret").await;
    assert!(!token_of(&records(&first, "User")[0]).is_empty());

    let token = token_of(&records(&first, "User")[0]).to_string();
    let read = ctx
        .send_with_token(&token, json!({"User": {"where": {"id": "1"}}}))
        .await;
    assert!(records(&read, "User")[0].get("token").is_none());
}

#[test]
fn test_boot_requires_unique_login_column() {
    let tables = TableSchemas::from_json(&json!({
        "User": {
            "columns": {
                "email": "string/40",
                "password": "binary/64",
                "salt": "binary/16"
            }
        }
    }))
    .unwrap();

    let tokens = Arc::new(TokenService::generate().unwrap());
    let auth = AuthPlugin::configure(&Value::Null, tokens).unwrap();
    let store = Arc::new(MemoryStore::new(tables.clone()));
    let mut pipeline = Pipeline::new(store).with_plugin(Arc::new(auth));

    let err = pipeline.boot(&tables).unwrap_err();
    assert_eq!(err.plugin, "auth");
    assert!(matches!(err.source, PreRequisiteError::NotUnique { .. }));
    assert!(!pipeline.is_booted());
}

#[test]
fn test_boot_requires_wide_password_column() {
    let tables = TableSchemas::from_json(&json!({
        "User": {
            "columns": {
                "email": {"type": "string", "length": 40, "unique": true},
                "password": "string/64",
                "salt": "binary/16"
            }
        }
    }))
    .unwrap();

    let tokens = Arc::new(TokenService::generate().unwrap());
    let auth = AuthPlugin::configure(&Value::Null, tokens).unwrap();
    let store = Arc::new(MemoryStore::new(tables.clone()));
    let mut pipeline = Pipeline::new(store).with_plugin(Arc::new(auth));

    let err = pipeline.boot(&tables).unwrap_err();
    assert!(err
        .to_string()
        .contains("column `User.password` must be binary with length of at least 64"));
}
