//! Trust store for opaque session tokens.
//!
//! Raw token values are only ever returned to the caller that asked for the
//! issue; the store keys records by a SHA-256 of the value, so a dump of the
//! store is useless for replay. Absent, expired, and revoked tokens are one
//! uniform negative to `resolve`.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Opaque credential proving an established session.
#[derive(Clone, Debug)]
pub struct SessionToken {
    value: String,
    principal_id: String,
    issued_at: Instant,
    expires_at: Instant,
}

impl SessionToken {
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    #[must_use]
    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

struct TokenRecord {
    principal_id: String,
    issued_at: Instant,
    expires_at: Instant,
}

/// Shared, concurrent trust store. Reads do not block each other; issue and
/// revoke take the write lock so a token cannot be half-issued while another
/// request revokes it.
pub struct TokenStore {
    ttl: Duration,
    records: RwLock<HashMap<Vec<u8>, TokenRecord>>,
}

impl TokenStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh token bound to `principal_id`.
    ///
    /// # Errors
    /// Returns an error if the system randomness source fails.
    pub async fn issue(&self, principal_id: &str) -> Result<SessionToken> {
        let value = generate_token_value()?;
        let now = Instant::now();
        let record = TokenRecord {
            principal_id: principal_id.to_string(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let token = SessionToken {
            value: value.clone(),
            principal_id: record.principal_id.clone(),
            issued_at: record.issued_at,
            expires_at: record.expires_at,
        };

        let mut records = self.records.write().await;
        // Opportunistic sweep keeps expired entries from accumulating.
        records.retain(|_, entry| entry.expires_at > now);
        records.insert(hash_token_value(&value), record);
        Ok(token)
    }

    /// Resolve a presented raw token to its binding.
    ///
    /// The hash is computed before the lookup on every call, so the negative
    /// paths (absent, expired, revoked) have the same shape.
    pub async fn resolve(&self, raw: &str) -> Option<SessionToken> {
        let key = hash_token_value(raw);
        let now = Instant::now();
        let records = self.records.read().await;
        let record = records.get(&key)?;
        if record.expires_at <= now {
            return None;
        }
        Some(SessionToken {
            value: raw.to_string(),
            principal_id: record.principal_id.clone(),
            issued_at: record.issued_at,
            expires_at: record.expires_at,
        })
    }

    /// Remove a token from the trust store. Revoking an absent token is not
    /// an error.
    pub async fn revoke(&self, raw: &str) {
        let key = hash_token_value(raw);
        let mut records = self.records.write().await;
        records.remove(&key);
    }

    /// Number of unexpired sessions currently trusted.
    pub async fn active_sessions(&self) -> usize {
        let now = Instant::now();
        let records = self.records.read().await;
        records
            .values()
            .filter(|record| record.expires_at > now)
            .count()
    }
}

/// 32 random bytes, base64url without padding. The raw value is only handed
/// to the authenticated caller; the store keeps the hash.
fn generate_token_value() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

fn hash_token_value(raw: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hasher.finalize().to_vec()
}
