//! Authentication collaborator. Token issuance and user registration are
//! external; this backend only resolves an opaque token to a user id.

use dashmap::DashMap;

use crate::collab::quiz::UserId;

/// Resolves caller tokens to user ids.
pub trait AuthProvider: Send + Sync {
    /// Return the user the token belongs to, or `None` for unknown tokens.
    fn resolve(&self, token: &str) -> Option<UserId>;
}

/// In-memory token table seeded at startup (or by tests).
#[derive(Debug, Default)]
pub struct StaticTokens {
    tokens: DashMap<String, UserId>,
}

impl StaticTokens {
    /// Create an empty token table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user.
    pub fn insert(&self, token: impl Into<String>, user_id: UserId) {
        self.tokens.insert(token.into(), user_id);
    }
}

impl AuthProvider for StaticTokens {
    fn resolve(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).map(|entry| *entry.value())
    }
}
