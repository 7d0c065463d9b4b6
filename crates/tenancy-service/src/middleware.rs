//! # Middleware
//!
//! [`Instrumented`] wraps any facade implementation, forwards every call
//! unchanged and reports `(method, elapsed, error)` to its observers.
//! Stacks are composed once at startup:
//!
//! ```rust
//! use std::sync::Arc;
//! use tenancy_auth::AuthConfig;
//! use tenancy_service::{AuthCore, AuthService, Instrumented, TracingObserver};
//!
//! let core = AuthCore::in_memory(AuthConfig::default()).unwrap();
//! let service: Arc<dyn AuthService> =
//!     Arc::new(Instrumented::new(core).with_observer(Arc::new(TracingObserver)));
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tenancy_auth::{AuthError, AuthResult, Identity, Key, NewKey};
use tenancy_org::{
    Backup, GroupGrant, InviteFilter, MemberRole, NewOrg, NewOrgInvite, Org, OrgFilter, OrgGroup,
    OrgInvite, OrgMembership, OrgUpdate, Page, Paged, PlatformInvite, PlatformInviteFilter,
};
use tenancy_rbac::{AccessRequest, MembershipRole, PlatformRole};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::service::{
    IdentityService, InviteService, MembershipService, OrgService, RoleService,
};

/// Outcome of one facade call.
#[derive(Debug, Clone, Copy)]
pub struct CallRecord<'a> {
    /// Operation name
    pub method: &'static str,
    /// Wall time spent in the wrapped service
    pub elapsed: Duration,
    /// Error returned, if any
    pub error: Option<&'a AuthError>,
}

/// Receives a record of every facade call.
pub trait CallObserver: Send + Sync {
    fn observe(&self, record: &CallRecord<'_>);
}

/// Logs every call with tracing.
///
/// Server errors are logged at error level, request errors at warn level,
/// successes at debug level.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn observe(&self, record: &CallRecord<'_>) {
        let elapsed_ms = record.elapsed.as_millis() as u64;
        match record.error {
            Some(e) if e.is_server_error() => error!(
                method = record.method,
                elapsed_ms,
                error = %e,
                "Call failed"
            ),
            Some(e) => warn!(
                method = record.method,
                elapsed_ms,
                error_code = e.error_code(),
                error = %e,
                "Call rejected"
            ),
            None => debug!(method = record.method, elapsed_ms, "Call completed"),
        }
    }
}

/// Facade wrapper reporting each call to a list of observers.
pub struct Instrumented<S> {
    inner: S,
    observers: Vec<Arc<dyn CallObserver>>,
}

impl<S> std::fmt::Debug for Instrumented<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumented")
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl<S> Instrumented<S> {
    /// Wrap `inner` without observers.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            observers: Vec::new(),
        }
    }

    /// Add an observer.
    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The wrapped service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn report<T>(&self, method: &'static str, started: Instant, result: &AuthResult<T>) {
        let record = CallRecord {
            method,
            elapsed: started.elapsed(),
            error: result.as_ref().err(),
        };
        for observer in &self.observers {
            observer.observe(&record);
        }
    }

    async fn observed<T, F>(&self, method: &'static str, call: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        let started = Instant::now();
        let result = call.await;
        self.report(method, started, &result);
        result
    }
}

#[async_trait]
impl<S: IdentityService> IdentityService for Instrumented<S> {
    async fn issue(&self, token: &str, key: NewKey) -> AuthResult<(Key, String)> {
        self.observed("issue", self.inner.issue(token, key)).await
    }

    async fn revoke(&self, token: &str, key_id: Uuid) -> AuthResult<()> {
        self.observed("revoke", self.inner.revoke(token, key_id)).await
    }

    async fn retrieve_key(&self, token: &str, key_id: Uuid) -> AuthResult<Key> {
        self.observed("retrieve_key", self.inner.retrieve_key(token, key_id))
            .await
    }

    async fn identify(&self, secret: &str) -> AuthResult<Identity> {
        self.observed("identify", self.inner.identify(secret)).await
    }

    fn authorize(&self, request: &AccessRequest) -> AuthResult<()> {
        let started = Instant::now();
        let result = self.inner.authorize(request);
        self.report("authorize", started, &result);
        result
    }
}

#[async_trait]
impl<S: RoleService> RoleService for Instrumented<S> {
    async fn assign_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()> {
        self.observed("assign_role", self.inner.assign_role(user_id, role))
            .await
    }

    async fn retrieve_role(&self, user_id: Uuid) -> AuthResult<Option<PlatformRole>> {
        self.observed("retrieve_role", self.inner.retrieve_role(user_id))
            .await
    }

    async fn update_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()> {
        self.observed("update_role", self.inner.update_role(user_id, role))
            .await
    }

    async fn remove_role(&self, user_id: Uuid) -> AuthResult<()> {
        self.observed("remove_role", self.inner.remove_role(user_id))
            .await
    }
}

#[async_trait]
impl<S: OrgService> OrgService for Instrumented<S> {
    async fn create_org(&self, token: &str, org: NewOrg) -> AuthResult<Org> {
        self.observed("create_org", self.inner.create_org(token, org))
            .await
    }

    async fn update_org(&self, token: &str, org_id: Uuid, update: OrgUpdate) -> AuthResult<Org> {
        self.observed("update_org", self.inner.update_org(token, org_id, update))
            .await
    }

    async fn remove_orgs(&self, token: &str, ids: &[Uuid]) -> AuthResult<()> {
        self.observed("remove_orgs", self.inner.remove_orgs(token, ids))
            .await
    }

    async fn view_org(&self, token: &str, org_id: Uuid) -> AuthResult<Org> {
        self.observed("view_org", self.inner.view_org(token, org_id))
            .await
    }

    async fn list_orgs(
        &self,
        token: &str,
        filter: &OrgFilter,
        page: Page,
    ) -> AuthResult<Paged<Org>> {
        self.observed("list_orgs", self.inner.list_orgs(token, filter, page))
            .await
    }

    async fn assign_org_groups(
        &self,
        token: &str,
        org_id: Uuid,
        group_ids: &[Uuid],
    ) -> AuthResult<()> {
        self.observed(
            "assign_org_groups",
            self.inner.assign_org_groups(token, org_id, group_ids),
        )
        .await
    }

    async fn unassign_org_groups(
        &self,
        token: &str,
        org_id: Uuid,
        group_ids: &[Uuid],
    ) -> AuthResult<()> {
        self.observed(
            "unassign_org_groups",
            self.inner.unassign_org_groups(token, org_id, group_ids),
        )
        .await
    }

    async fn list_org_groups(
        &self,
        token: &str,
        org_id: Uuid,
        page: Page,
    ) -> AuthResult<Paged<OrgGroup>> {
        self.observed(
            "list_org_groups",
            self.inner.list_org_groups(token, org_id, page),
        )
        .await
    }
}

#[async_trait]
impl<S: MembershipService> MembershipService for Instrumented<S> {
    async fn create_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        members: Vec<MemberRole>,
    ) -> AuthResult<Vec<OrgMembership>> {
        self.observed(
            "create_org_memberships",
            self.inner.create_org_memberships(token, org_id, members),
        )
        .await
    }

    async fn view_org_membership(
        &self,
        token: &str,
        org_id: Uuid,
        member_id: Uuid,
    ) -> AuthResult<OrgMembership> {
        self.observed(
            "view_org_membership",
            self.inner.view_org_membership(token, org_id, member_id),
        )
        .await
    }

    async fn list_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        page: Page,
    ) -> AuthResult<Paged<OrgMembership>> {
        self.observed(
            "list_org_memberships",
            self.inner.list_org_memberships(token, org_id, page),
        )
        .await
    }

    async fn update_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        members: &[MemberRole],
    ) -> AuthResult<()> {
        self.observed(
            "update_org_memberships",
            self.inner.update_org_memberships(token, org_id, members),
        )
        .await
    }

    async fn remove_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        member_ids: &[Uuid],
    ) -> AuthResult<()> {
        self.observed(
            "remove_org_memberships",
            self.inner.remove_org_memberships(token, org_id, member_ids),
        )
        .await
    }

    async fn retrieve_member_role(
        &self,
        member_id: Uuid,
        org_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>> {
        self.observed(
            "retrieve_member_role",
            self.inner.retrieve_member_role(member_id, org_id),
        )
        .await
    }

    async fn retrieve_group_role(
        &self,
        member_id: Uuid,
        group_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>> {
        self.observed(
            "retrieve_group_role",
            self.inner.retrieve_group_role(member_id, group_id),
        )
        .await
    }

    async fn backup(&self, token: &str) -> AuthResult<Backup> {
        self.observed("backup", self.inner.backup(token)).await
    }

    async fn restore(&self, token: &str, backup: Backup) -> AuthResult<()> {
        self.observed("restore", self.inner.restore(token, backup))
            .await
    }

    async fn backup_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
    ) -> AuthResult<Vec<OrgMembership>> {
        self.observed(
            "backup_org_memberships",
            self.inner.backup_org_memberships(token, org_id),
        )
        .await
    }

    async fn restore_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        rows: Vec<OrgMembership>,
    ) -> AuthResult<()> {
        self.observed(
            "restore_org_memberships",
            self.inner.restore_org_memberships(token, org_id, rows),
        )
        .await
    }
}

#[async_trait]
impl<S: InviteService> InviteService for Instrumented<S> {
    async fn create_org_invite(
        &self,
        token: &str,
        invite: NewOrgInvite,
        redirect_path: &str,
    ) -> AuthResult<OrgInvite> {
        self.observed(
            "create_org_invite",
            self.inner.create_org_invite(token, invite, redirect_path),
        )
        .await
    }

    async fn create_dormant_org_invite(
        &self,
        token: &str,
        org_id: Uuid,
        role: MembershipRole,
        platform_invite_id: Uuid,
        groups: Vec<GroupGrant>,
    ) -> AuthResult<OrgInvite> {
        self.observed(
            "create_dormant_org_invite",
            self.inner
                .create_dormant_org_invite(token, org_id, role, platform_invite_id, groups),
        )
        .await
    }

    async fn activate_org_invite(
        &self,
        platform_invite_id: Uuid,
        user_id: Uuid,
        redirect_path: &str,
    ) -> AuthResult<Vec<OrgInvite>> {
        self.observed(
            "activate_org_invite",
            self.inner
                .activate_org_invite(platform_invite_id, user_id, redirect_path),
        )
        .await
    }

    async fn respond_org_invite(
        &self,
        token: &str,
        invite_id: Uuid,
        accept: bool,
    ) -> AuthResult<OrgInvite> {
        self.observed(
            "respond_org_invite",
            self.inner.respond_org_invite(token, invite_id, accept),
        )
        .await
    }

    async fn revoke_org_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<()> {
        self.observed(
            "revoke_org_invite",
            self.inner.revoke_org_invite(token, invite_id),
        )
        .await
    }

    async fn view_org_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<OrgInvite> {
        self.observed("view_org_invite", self.inner.view_org_invite(token, invite_id))
            .await
    }

    async fn list_org_invites_by_user(
        &self,
        token: &str,
        user_id: Uuid,
        filter: InviteFilter,
    ) -> AuthResult<Paged<OrgInvite>> {
        self.observed(
            "list_org_invites_by_user",
            self.inner.list_org_invites_by_user(token, user_id, filter),
        )
        .await
    }

    async fn list_org_invites_by_org(
        &self,
        token: &str,
        org_id: Uuid,
        filter: InviteFilter,
    ) -> AuthResult<Paged<OrgInvite>> {
        self.observed(
            "list_org_invites_by_org",
            self.inner.list_org_invites_by_org(token, org_id, filter),
        )
        .await
    }

    async fn invite_platform_member(
        &self,
        token: &str,
        email: &str,
        redirect_path: &str,
    ) -> AuthResult<PlatformInvite> {
        self.observed(
            "invite_platform_member",
            self.inner.invite_platform_member(token, email, redirect_path),
        )
        .await
    }

    async fn revoke_platform_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<()> {
        self.observed(
            "revoke_platform_invite",
            self.inner.revoke_platform_invite(token, invite_id),
        )
        .await
    }

    async fn view_platform_invite(
        &self,
        token: &str,
        invite_id: Uuid,
    ) -> AuthResult<PlatformInvite> {
        self.observed(
            "view_platform_invite",
            self.inner.view_platform_invite(token, invite_id),
        )
        .await
    }

    async fn list_platform_invites(
        &self,
        token: &str,
        filter: PlatformInviteFilter,
    ) -> AuthResult<Paged<PlatformInvite>> {
        self.observed(
            "list_platform_invites",
            self.inner.list_platform_invites(token, filter),
        )
        .await
    }

    async fn validate_platform_invite(
        &self,
        invite_id: Uuid,
        email: &str,
    ) -> AuthResult<PlatformInvite> {
        self.observed(
            "validate_platform_invite",
            self.inner.validate_platform_invite(invite_id, email),
        )
        .await
    }
}
