//! Salted password digests.
//!
//! Digests are PBKDF2-HMAC-SHA512 with a fixed iteration count and output
//! length. The parameters are part of the stored format: changing any of
//! them invalidates every stored credential.

use std::num::NonZeroU32;

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

use crate::error::HashError;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 64;

/// PBKDF2 iteration count.
pub const ITERATIONS: NonZeroU32 = match NonZeroU32::new(10_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA512;

/// Salt generation and digest derivation.
#[derive(Debug, Clone)]
pub struct HashEngine {
    rng: SystemRandom,
}

impl Default for HashEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HashEngine {
    /// Create an engine backed by the system random source.
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Generate a fresh random salt.
    pub fn generate_salt(&self) -> Result<[u8; SALT_LEN], HashError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| HashError::RandomUnavailable)?;
        Ok(salt)
    }

    /// Derive the digest of `password` under `salt`.
    ///
    /// Deterministic for a given pair. An empty salt is accepted for
    /// deployments that store no salt column.
    pub fn derive_digest(password: &[u8], salt: &[u8]) -> [u8; DIGEST_LEN] {
        let mut digest = [0u8; DIGEST_LEN];
        pbkdf2::derive(ALGORITHM, ITERATIONS, salt, password, &mut digest);
        digest
    }

    /// Derive a digest on the blocking pool.
    pub async fn derive_digest_async(
        password: String,
        salt: Vec<u8>,
    ) -> Result<[u8; DIGEST_LEN], HashError> {
        tokio::task::spawn_blocking(move || Self::derive_digest(password.as_bytes(), &salt))
            .await
            .map_err(|e| HashError::Task(e.to_string()))
    }

    /// Compare two digests in constant time.
    pub fn digests_equal(a: &[u8], b: &[u8]) -> bool {
        a.len() == b.len() && bool::from(a.ct_eq(b))
    }
}
