//! Bearer token issuance and verification.
//!
//! Tokens are EdDSA-signed JWTs. The signing key pair is generated once when
//! the service is constructed and lives as long as the service; there is no
//! rotation, persistence, or revocation. Expiry is the only invalidation.
//!
//! # Claims
//!
//! ```json
//! {
//!   "sub": "42",
//!   "iat": 1735603200,
//!   "nbf": 1735603200,
//!   "exp": 1735610400
//! }
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Lifetime of every issued token.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

const ALGORITHM: Algorithm = Algorithm::EdDSA;

/// Claims embedded in issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (record id).
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// Not before (Unix timestamp).
    pub nbf: u64,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// Signs and verifies bearer tokens with a process-lifetime key pair.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Generate a fresh Ed25519 key pair.
    pub fn generate() -> Result<Self, TokenError> {
        let rng = SystemRandom::new();
        let document = Ed25519KeyPair::generate_pkcs8(&rng)
            .map_err(|e| TokenError::KeyGeneration(e.to_string()))?;
        let pair = Ed25519KeyPair::from_pkcs8(document.as_ref())
            .map_err(|e| TokenError::KeyGeneration(e.to_string()))?;

        Ok(Self {
            encoding_key: EncodingKey::from_ed_der(document.as_ref()),
            decoding_key: DecodingKey::from_ed_der(pair.public_key().as_ref()),
        })
    }

    /// Lifetime of issued tokens.
    pub fn expiry(&self) -> Duration {
        TOKEN_LIFETIME
    }

    /// Issue a token for `subject`, valid from now for [`TOKEN_LIFETIME`].
    pub fn sign(&self, subject: &str) -> Result<String, TokenError> {
        self.sign_at(subject, now())
    }

    pub(crate) fn sign_at(&self, subject: &str, issued_at: u64) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + TOKEN_LIFETIME.as_secs(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        let token_data =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                    ErrorKind::InvalidToken
                    | ErrorKind::InvalidSignature
                    | ErrorKind::InvalidAlgorithm
                    | ErrorKind::InvalidAlgorithmName
                    | ErrorKind::MissingRequiredClaim(_)
                    | ErrorKind::Base64(_)
                    | ErrorKind::Json(_)
                    | ErrorKind::Utf8(_) => TokenError::Invalid(e.to_string()),
                    _ => TokenError::Other(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Verify a token and return its subject.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.verify_claims(token)?.sub)
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
