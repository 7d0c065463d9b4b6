//! # Authorization facade
//!
//! The operation surface other services call. It is split by concern into
//! [`IdentityService`], [`RoleService`], [`OrgService`],
//! [`MembershipService`] and [`InviteService`]; [`AuthService`] bundles them
//! so a single `Arc<dyn AuthService>` can be passed around.
//!
//! Operations that act on behalf of a user take the caller's key secret as
//! `token`. The remaining ones (role assignment, invite activation, platform
//! invite validation, membership role lookups) are trusted calls made by
//! other internal services.

use async_trait::async_trait;
use tenancy_auth::{AuthResult, Identity, Key, NewKey};
use tenancy_org::{
    Backup, GroupGrant, InviteFilter, MemberRole, NewOrg, NewOrgInvite, Org, OrgFilter, OrgGroup,
    OrgInvite, OrgMembership, OrgUpdate, Page, Paged, PlatformInvite, PlatformInviteFilter,
};
use tenancy_rbac::{AccessRequest, MembershipRole, PlatformRole};
use uuid::Uuid;

/// Key lifecycle, identification and the authorization decision.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Mint a key and return its metadata with the opaque secret.
    ///
    /// Login and recovery keys are minted for `key.subject` without
    /// consulting `token`. API keys require a login key as `token`.
    async fn issue(&self, token: &str, key: NewKey) -> AuthResult<(Key, String)>;

    /// Remove one of the caller's keys. Unknown keys are not an error.
    async fn revoke(&self, token: &str, key_id: Uuid) -> AuthResult<()>;

    /// Metadata of one of the caller's keys.
    async fn retrieve_key(&self, token: &str, key_id: Uuid) -> AuthResult<Key>;

    /// Resolve a live key secret to its identity.
    async fn identify(&self, secret: &str) -> AuthResult<Identity>;

    /// Pure authorization decision; `Forbidden` on deny.
    fn authorize(&self, request: &AccessRequest) -> AuthResult<()>;
}

/// Platform role assignments.
#[async_trait]
pub trait RoleService: Send + Sync {
    async fn assign_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()>;

    /// `None` for users without an assignment.
    async fn retrieve_role(&self, user_id: Uuid) -> AuthResult<Option<PlatformRole>>;

    async fn update_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()>;

    async fn remove_role(&self, user_id: Uuid) -> AuthResult<()>;
}

/// Organizations and their group associations.
#[async_trait]
pub trait OrgService: Send + Sync {
    async fn create_org(&self, token: &str, org: NewOrg) -> AuthResult<Org>;

    async fn update_org(&self, token: &str, org_id: Uuid, update: OrgUpdate) -> AuthResult<Org>;

    /// Delete organizations. All or nothing; absent IDs are skipped.
    async fn remove_orgs(&self, token: &str, ids: &[Uuid]) -> AuthResult<()>;

    async fn view_org(&self, token: &str, org_id: Uuid) -> AuthResult<Org>;

    /// Platform admins see every organization, everyone else the ones they
    /// own or belong to.
    async fn list_orgs(&self, token: &str, filter: &OrgFilter, page: Page)
        -> AuthResult<Paged<Org>>;

    async fn assign_org_groups(&self, token: &str, org_id: Uuid, group_ids: &[Uuid])
        -> AuthResult<()>;

    async fn unassign_org_groups(
        &self,
        token: &str,
        org_id: Uuid,
        group_ids: &[Uuid],
    ) -> AuthResult<()>;

    async fn list_org_groups(&self, token: &str, org_id: Uuid, page: Page)
        -> AuthResult<Paged<OrgGroup>>;
}

/// Org and group memberships, backup and restore.
#[async_trait]
pub trait MembershipService: Send + Sync {
    /// Add members in one step. Any conflict aborts the whole batch.
    async fn create_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        members: Vec<MemberRole>,
    ) -> AuthResult<Vec<OrgMembership>>;

    async fn view_org_membership(
        &self,
        token: &str,
        org_id: Uuid,
        member_id: Uuid,
    ) -> AuthResult<OrgMembership>;

    async fn list_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        page: Page,
    ) -> AuthResult<Paged<OrgMembership>>;

    /// Change roles. `NotFound` when any member is missing.
    async fn update_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        members: &[MemberRole],
    ) -> AuthResult<()>;

    async fn remove_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        member_ids: &[Uuid],
    ) -> AuthResult<()>;

    /// `None` when the user is not a member.
    async fn retrieve_member_role(
        &self,
        member_id: Uuid,
        org_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>>;

    /// `None` when the user is not in the group.
    async fn retrieve_group_role(
        &self,
        member_id: Uuid,
        group_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>>;

    async fn backup(&self, token: &str) -> AuthResult<Backup>;

    async fn restore(&self, token: &str, backup: Backup) -> AuthResult<()>;

    async fn backup_org_memberships(&self, token: &str, org_id: Uuid)
        -> AuthResult<Vec<OrgMembership>>;

    async fn restore_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        rows: Vec<OrgMembership>,
    ) -> AuthResult<()>;
}

/// Org and platform invites.
#[async_trait]
pub trait InviteService: Send + Sync {
    /// Invite a user, or an email without an account, into an organization.
    async fn create_org_invite(
        &self,
        token: &str,
        invite: NewOrgInvite,
        redirect_path: &str,
    ) -> AuthResult<OrgInvite>;

    /// Create a dormant org invite bound to an existing platform invite.
    async fn create_dormant_org_invite(
        &self,
        token: &str,
        org_id: Uuid,
        role: MembershipRole,
        platform_invite_id: Uuid,
        groups: Vec<GroupGrant>,
    ) -> AuthResult<OrgInvite>;

    /// Hand every dormant invite of an accepted platform invite to the newly
    /// registered user. Repeated calls return an empty list.
    async fn activate_org_invite(
        &self,
        platform_invite_id: Uuid,
        user_id: Uuid,
        redirect_path: &str,
    ) -> AuthResult<Vec<OrgInvite>>;

    async fn respond_org_invite(
        &self,
        token: &str,
        invite_id: Uuid,
        accept: bool,
    ) -> AuthResult<OrgInvite>;

    async fn revoke_org_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<()>;

    async fn view_org_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<OrgInvite>;

    async fn list_org_invites_by_user(
        &self,
        token: &str,
        user_id: Uuid,
        filter: InviteFilter,
    ) -> AuthResult<Paged<OrgInvite>>;

    async fn list_org_invites_by_org(
        &self,
        token: &str,
        org_id: Uuid,
        filter: InviteFilter,
    ) -> AuthResult<Paged<OrgInvite>>;

    async fn invite_platform_member(
        &self,
        token: &str,
        email: &str,
        redirect_path: &str,
    ) -> AuthResult<PlatformInvite>;

    async fn revoke_platform_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<()>;

    async fn view_platform_invite(&self, token: &str, invite_id: Uuid)
        -> AuthResult<PlatformInvite>;

    async fn list_platform_invites(
        &self,
        token: &str,
        filter: PlatformInviteFilter,
    ) -> AuthResult<Paged<PlatformInvite>>;

    /// Accept a pending platform invite addressed to `email`.
    async fn validate_platform_invite(&self, invite_id: Uuid, email: &str)
        -> AuthResult<PlatformInvite>;
}

/// The complete facade.
pub trait AuthService:
    IdentityService + RoleService + OrgService + MembershipService + InviteService
{
}

impl<T> AuthService for T where
    T: IdentityService + RoleService + OrgService + MembershipService + InviteService
{
}
