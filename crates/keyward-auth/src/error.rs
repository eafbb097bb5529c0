//! Authentication error types.

use http::StatusCode;
use keyward_schema::{ColumnType, ValidationError};
use thiserror::Error;

/// Errors that end a request. Each maps to one status code.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Missing or mistyped login or password.
    #[error("{0}")]
    BadRequest(String),

    /// No user matches the login value.
    #[error("No user found for {0}")]
    NotFound(String),

    /// Password does not match the stored digest.
    #[error("Wrong password provided for user {0}")]
    WrongPassword(String),

    /// Bearer token past its expiry.
    #[error("{0}")]
    TokenExpired(String),

    /// Bearer token with a bad signature or malformed encoding.
    #[error("{0}")]
    TokenInvalid(String),

    /// Bearer token used before its not-before time.
    #[error("{0}")]
    TokenNotYetValid(String),

    /// Invariant violation or unexpected collaborator failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Status code reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::WrongPassword(_)
            | AuthError::TokenExpired(_)
            | AuthError::TokenInvalid(_)
            | AuthError::TokenNotYetValid(_) => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired(err.to_string()),
            TokenError::Invalid(_) => AuthError::TokenInvalid(err.to_string()),
            TokenError::NotYetValid => AuthError::TokenNotYetValid(err.to_string()),
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<QueryError> for AuthError {
    fn from(err: QueryError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// Token signing and verification errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// Signature mismatch or malformed token.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Token is not valid yet.
    #[error("token is not valid yet")]
    NotYetValid,

    /// Key pair generation failed.
    #[error("failed to generate signing key: {0}")]
    KeyGeneration(String),

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Any other verification failure.
    #[error("token verification failed: {0}")]
    Other(String),
}

/// Password hashing errors.
#[derive(Debug, Error)]
pub enum HashError {
    /// The system random source failed.
    #[error("secure random source unavailable")]
    RandomUnavailable,

    /// The blocking derivation task did not complete.
    #[error("digest task failed: {0}")]
    Task(String),
}

/// Errors from the data-query collaborator.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Table is not declared.
    #[error("unknown table `{0}`")]
    UnknownTable(String),

    /// A unique column already holds the value.
    #[error("duplicate value for unique column `{table}.{column}`")]
    UniqueViolation {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Record or filter has the wrong shape.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Backend failure.
    #[error("query backend error: {0}")]
    Backend(String),
}

impl QueryError {
    /// Status code reported when a query fails outside plugin hooks.
    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::UnknownTable(_) => StatusCode::NOT_FOUND,
            QueryError::UniqueViolation { .. } => StatusCode::CONFLICT,
            QueryError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
            QueryError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Plugin configuration errors. Fatal at boot.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Options failed structural validation.
    #[error("invalid auth options: {0}")]
    Invalid(#[from] ValidationError),

    /// A column or table option is empty.
    #[error("option `{0}` must be a non-empty string")]
    Empty(&'static str),

    /// `salt` is neither a column name nor falsy.
    #[error("option `salt` must be a column name or a falsy value")]
    InvalidSalt,

    /// Two options name the same column.
    #[error("options `{0}` and `{1}` must name different columns")]
    SameColumn(&'static str, &'static str),

    /// Options could not be deserialized.
    #[error("failed to read auth options: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Boot-time table prerequisite failures.
#[derive(Debug, Error)]
pub enum PreRequisiteError {
    /// The user table is not declared.
    #[error("table `{0}` is not declared")]
    MissingTable(String),

    /// A required column is not declared.
    #[error("column `{table}.{column}` is not declared")]
    MissingColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A column has the wrong type or is too short.
    #[error(
        "column `{table}.{column}` must be {expected} with length of at least {min_length}, found {found}"
    )]
    ColumnMismatch {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Required column type.
        expected: ColumnType,
        /// Required minimum length.
        min_length: u32,
        /// Declared type and length.
        found: String,
    },

    /// The login column has no unique index.
    #[error("column `{table}.{column}` must carry a unique index")]
    NotUnique {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
}

/// A plugin refused activation.
#[derive(Debug, Error)]
#[error("plugin `{plugin}` cannot be activated: {source}")]
pub struct BootError {
    /// Plugin name.
    pub plugin: String,
    /// Failed prerequisite.
    pub source: PreRequisiteError,
}
