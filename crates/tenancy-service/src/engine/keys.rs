use async_trait::async_trait;
use tenancy_auth::{AuthError, AuthResult, Identity, Key, KeyType, NewKey};
use tenancy_rbac::{AccessRequest, Action, ResourceType};
use tenancy_store::KeyRepository;
use tracing::{info, instrument};
use uuid::Uuid;

use super::AuthCore;
use crate::service::IdentityService;

#[async_trait]
impl IdentityService for AuthCore {
    #[instrument(skip(self, token, key), fields(key_type = %key.key_type))]
    async fn issue(&self, token: &str, key: NewKey) -> AuthResult<(Key, String)> {
        let now = self.now();

        let key = match key.key_type {
            KeyType::Login | KeyType::Recovery => {
                let subject = key.subject.ok_or_else(|| {
                    AuthError::malformed(format!("{} keys need a subject", key.key_type))
                })?;
                let expires_at = key
                    .expires_at
                    .or_else(|| self.config.key_ttl(key.key_type).map(|ttl| now + ttl));
                Key::new(key.key_type, subject, subject, now, expires_at)
            }
            KeyType::Api => {
                let caller = self.caller(token).await?;
                if caller.identity.key_type != KeyType::Login {
                    return Err(AuthError::unauthenticated("API keys are issued with a login key"));
                }
                let subject = key.subject.unwrap_or(caller.id());
                self.check(
                    &caller
                        .request(ResourceType::Key, Action::Create)
                        .with_owner(subject),
                )?;
                Key::new(KeyType::Api, subject, caller.id(), now, key.expires_at)
            }
        };

        let secret = self.tokenizer.encode(&key)?;
        self.store.save_key(key.clone()).await?;

        info!(key_id = %key.id, subject = %key.subject, "Issued key");
        Ok((key, secret))
    }

    #[instrument(skip(self, token))]
    async fn revoke(&self, token: &str, key_id: Uuid) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.store.remove_key(caller.id(), key_id).await
    }

    async fn retrieve_key(&self, token: &str, key_id: Uuid) -> AuthResult<Key> {
        let caller = self.caller(token).await?;
        self.store.retrieve_key(caller.id(), key_id).await
    }

    async fn identify(&self, secret: &str) -> AuthResult<Identity> {
        self.resolve_identity(secret).await
    }

    fn authorize(&self, request: &AccessRequest) -> AuthResult<()> {
        self.check(request)
    }
}
