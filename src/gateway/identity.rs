//! Principal model and identity provider boundary.
//!
//! The gateway never owns user records. A token references its principal by
//! id only; the authoritative identity data lives behind [`IdentityProvider`],
//! which is typically a directory service. [`StaticDirectory`] is the
//! file-backed implementation used for small deployments and tests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// Authenticated identity and its authorization attributes.
///
/// Immutable snapshot attached to a successful authentication outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub user_key: String,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Principal>>> + Send + 'a>>;

/// External identity lookup. `Ok(None)` means the subject does not exist;
/// `Err` is an infrastructure fault and maps to an internal-error denial.
pub trait IdentityProvider: Send + Sync {
    fn lookup<'a>(&'a self, principal_id: &'a str) -> LookupFuture<'a>;
}

/// In-memory directory loaded from a JSON array of principals.
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    users: HashMap<String, Principal>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(principals: Vec<Principal>) -> Self {
        let users = principals
            .into_iter()
            .map(|principal| (principal.user_id.clone(), principal))
            .collect();
        Self { users }
    }

    /// Load a directory from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read users file: {}", path.display()))?;
        let principals: Vec<Principal> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid users file: {}", path.display()))?;
        Ok(Self::new(principals))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityProvider for StaticDirectory {
    fn lookup<'a>(&'a self, principal_id: &'a str) -> LookupFuture<'a> {
        let found = self.users.get(principal_id).cloned();
        Box::pin(async move { Ok(found) })
    }
}
