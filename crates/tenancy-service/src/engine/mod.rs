//! # Service engine
//!
//! [`AuthCore`] implements the whole facade over injected ports. Each
//! operation resolves the caller, gathers the facts the policy needs from
//! the store, asks [`tenancy_rbac::authorize`] for a decision and only then
//! touches the store.

mod invites;
mod keys;
mod members;
mod orgs;
mod roles;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tenancy_auth::{AuthConfig, AuthError, AuthResult, Identity, JwtTokenizer, KeyType, Tokenizer};
use tenancy_org::{GroupGrant, Org};
use tenancy_rbac::{authorize, AccessRequest, Action, Decision, OrgScope, PlatformRole, ResourceType};
use tenancy_store::{
    KeyRepository, MembershipRepository, MemoryStore, OrgRepository, RoleRepository, Store,
};
use tracing::debug;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::directory::{MemoryDirectory, UserDirectory};
use crate::notify::{InviteNotifier, TracingNotifier};

/// The authenticated principal behind a token.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Caller {
    identity: Identity,
    role: PlatformRole,
}

impl Caller {
    fn id(&self) -> Uuid {
        self.identity.user_id
    }

    fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    fn request(&self, resource: ResourceType, action: Action) -> AccessRequest {
        AccessRequest::new(self.id(), self.role, resource, action)
    }
}

/// Authorization and membership core.
pub struct AuthCore {
    store: Arc<dyn Store>,
    tokenizer: Arc<dyn Tokenizer>,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn InviteNotifier>,
    config: AuthConfig,
}

impl std::fmt::Debug for AuthCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthCore {
    /// Create a core over the given ports.
    pub fn new(
        store: Arc<dyn Store>,
        tokenizer: Arc<dyn Tokenizer>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn InviteNotifier>,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            tokenizer,
            clock,
            directory,
            notifier,
            config,
        }
    }

    /// Single-process core: memory store, empty directory, console
    /// notifications, wall clock.
    pub fn in_memory(config: AuthConfig) -> AuthResult<Self> {
        config.validate()?;
        let tokenizer = JwtTokenizer::from_config(&config)?;
        Ok(Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(tokenizer),
            Arc::new(SystemClock),
            Arc::new(MemoryDirectory::new()),
            Arc::new(TracingNotifier),
            config,
        ))
    }

    /// Configuration in effect.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolve a secret to the identity of a live key.
    async fn resolve_identity(&self, secret: &str) -> AuthResult<Identity> {
        let claims = self.tokenizer.decode(secret)?;
        let key_id = claims.key_id()?;
        let issuer_id = claims.issuer_id()?;

        let key = match self.store.retrieve_key(issuer_id, key_id).await {
            Ok(key) => key,
            Err(AuthError::NotFound(_)) => {
                return Err(AuthError::unauthenticated("Unknown or revoked key"));
            }
            Err(e) => return Err(e),
        };

        if key.subject != claims.subject()? || key.key_type != claims.typ {
            return Err(AuthError::unauthenticated("Key does not match its secret"));
        }
        if key.is_expired(self.now()) {
            return Err(AuthError::unauthenticated("Key expired"));
        }

        Ok(Identity::from(&key))
    }

    /// Resolve the caller behind `token`. Recovery keys cannot act.
    async fn caller(&self, token: &str) -> AuthResult<Caller> {
        let identity = self.resolve_identity(token).await?;
        if identity.key_type == KeyType::Recovery {
            return Err(AuthError::unauthenticated(
                "Recovery keys cannot be used for this operation",
            ));
        }

        let role = self
            .store
            .retrieve_role(identity.user_id)
            .await?
            .unwrap_or_default();

        Ok(Caller { identity, role })
    }

    fn check(&self, request: &AccessRequest) -> AuthResult<()> {
        match authorize(request) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                debug!(
                    subject = %request.subject,
                    resource = %request.resource,
                    action = %request.action,
                    reason = %reason,
                    "Access denied"
                );
                Err(AuthError::Forbidden(reason))
            }
        }
    }

    /// Decide an action on a platform-scoped resource.
    fn authorize_platform(
        &self,
        caller: &Caller,
        resource: ResourceType,
        action: Action,
    ) -> AuthResult<()> {
        self.check(&caller.request(resource, action))
    }

    /// Decide an action inside `org`, as owner or through membership.
    async fn authorize_org(
        &self,
        caller: &Caller,
        org: &Org,
        resource: ResourceType,
        action: Action,
    ) -> AuthResult<()> {
        let member_role = self.store.retrieve_member_role(caller.id(), org.id).await?;
        let request = caller
            .request(resource, action)
            .with_owner(org.owner_id)
            .with_scope(OrgScope::new(org.id, member_role));
        self.check(&request)
    }

    /// Load an org and authorize `action` on `resource` inside it.
    async fn load_org(
        &self,
        caller: &Caller,
        org_id: Uuid,
        resource: ResourceType,
        action: Action,
    ) -> AuthResult<Org> {
        let org = self.store.retrieve_org(org_id).await?;
        self.authorize_org(caller, &org, resource, action).await?;
        Ok(org)
    }

    /// Every granted group must be associated with `org_id`.
    async fn ensure_groups(&self, org_id: Uuid, groups: &[GroupGrant]) -> AuthResult<()> {
        for grant in groups {
            let group = self.store.retrieve_group(grant.group_id).await?;
            if group.org_id != org_id {
                return Err(AuthError::not_found(format!(
                    "group {} in organization {}",
                    grant.group_id, org_id
                )));
            }
        }
        Ok(())
    }
}
