//! Verification tokens.

use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How long a token stays valid.
pub const TOKEN_TTL: Duration = Duration::from_secs(600);

/// Random bytes per token secret.
const SECRET_BYTES: usize = 16;

/// Cache key prefix for pending tokens.
const KEY_PREFIX: &str = "verify:";

/// A pending proof-of-ownership secret for one Discord user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationToken {
    pub owner: u64,
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Generate a fresh token: 16 random bytes, base64 encoded.
    pub fn generate(owner: u64, ttl: Duration) -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().fill(&mut bytes);

        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(TOKEN_TTL.as_secs() as i64));
        Self {
            owner,
            secret: base64::engine::general_purpose::STANDARD.encode(bytes),
            expires_at: Utc::now() + ttl,
        }
    }

    /// Whether `supplied` is this token's secret.
    pub fn matches(&self, supplied: &str) -> bool {
        constant_time_eq(self.secret.as_bytes(), supplied.as_bytes())
    }
}

/// Cache key holding the pending token of `owner`.
pub fn cache_key(owner: u64) -> String {
    format!("{}{}", KEY_PREFIX, owner)
}

/// Compare without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
