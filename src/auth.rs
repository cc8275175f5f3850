//! Identity - who is driving a session
//!
//! The lab never stores or checks credentials itself; it asks an
//! [`IdentityProvider`] to turn a login token into a stable [`UserId`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Opaque, stable user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an identity-provider issued id
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticates a caller and yields their user id
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a login token; unknown tokens are [`Error::Unauthenticated`]
    async fn authenticate(&self, token: &str) -> Result<UserId>;
}

/// Identity provider backed by the configured user → token table
pub struct StaticTokenIdentity {
    tokens: HashMap<String, SecretString>,
}

impl StaticTokenIdentity {
    /// Build from the `auth` config section
    pub fn new(config: &AuthConfig) -> Self {
        StaticTokenIdentity {
            tokens: config.tokens.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn authenticate(&self, token: &str) -> Result<UserId> {
        if token.is_empty() {
            return Err(Error::Unauthenticated);
        }
        self.tokens
            .iter()
            .find(|(_, expected)| expected.expose_secret() == token)
            .map(|(user, _)| UserId::new(user.clone()))
            .ok_or(Error::Unauthenticated)
    }
}
