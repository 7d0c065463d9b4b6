//! User directory port.
//!
//! The tenancy core does not own user accounts. When an org invite names an
//! email, the [`UserDirectory`] decides whether it belongs to an existing
//! user (addressed invite) or not (dormant invite plus platform invite).

use std::collections::HashMap;

use async_trait::async_trait;
use tenancy_auth::AuthResult;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Lookup of registered users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ID of the user registered with a normalized `email`, if any.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Uuid>>;
}

/// In-memory directory keyed by lower-cased email.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<String, Uuid>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user under `email`.
    pub async fn register(&self, email: &str, user_id: Uuid) {
        self.users
            .write()
            .await
            .insert(email.trim().to_lowercase(), user_id);
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Uuid>> {
        Ok(self.users.read().await.get(email).copied())
    }
}
