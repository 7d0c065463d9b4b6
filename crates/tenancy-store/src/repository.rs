//! Repository ports
//!
//! One async trait per persisted concern. Every multi-row operation is atomic:
//! an implementation either applies all rows or returns an error and applies
//! none. Implementations translate their own failures into [`AuthError`]
//! before returning.
//!
//! [`AuthError`]: tenancy_auth::AuthError

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tenancy_auth::{AuthResult, Key};
use tenancy_org::{
    Backup, InviteDirection, InviteState, MemberRole, Org, OrgFilter, OrgGroup, OrgInvite,
    OrgMembership, Page, Paged, PlatformInvite, PlatformInviteFilter,
};
use tenancy_rbac::{MembershipRole, PlatformRole};
use uuid::Uuid;

/// Rows targeted by an org invite expiry sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgInviteScope {
    /// A single invite.
    Id(Uuid),
    /// Invites the user sent or received.
    User(Uuid),
    /// The "one pending per (invitee, org)" slot.
    Slot { invitee_id: Uuid, org_id: Uuid },
    /// Every invite of an organization.
    Org(Uuid),
}

impl OrgInviteScope {
    /// Whether `invite` falls inside this scope.
    pub fn contains(&self, invite: &OrgInvite) -> bool {
        match *self {
            OrgInviteScope::Id(id) => invite.id == id,
            OrgInviteScope::User(user_id) => {
                invite.inviter_id == user_id || invite.invitee_id == Some(user_id)
            }
            OrgInviteScope::Slot { invitee_id, org_id } => {
                invite.invitee_id == Some(invitee_id) && invite.org_id == org_id
            }
            OrgInviteScope::Org(org_id) => invite.org_id == org_id,
        }
    }
}

/// Rows targeted by a platform invite expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformInviteScope {
    /// A single invite.
    Id(Uuid),
    /// Invites addressed to a normalized email.
    Email(String),
    /// Every platform invite.
    All,
}

impl PlatformInviteScope {
    pub fn contains(&self, invite: &PlatformInvite) -> bool {
        match self {
            PlatformInviteScope::Id(id) => invite.id == *id,
            PlatformInviteScope::Email(email) => invite.invitee_email == *email,
            PlatformInviteScope::All => true,
        }
    }
}

/// Selection for org invite listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgInviteQuery {
    /// Invites involving a user on the given side.
    User {
        user_id: Uuid,
        direction: InviteDirection,
        state: Option<InviteState>,
    },
    /// Invites of an organization.
    Org {
        org_id: Uuid,
        state: Option<InviteState>,
    },
}

impl OrgInviteQuery {
    pub fn matches(&self, invite: &OrgInvite) -> bool {
        match *self {
            OrgInviteQuery::User {
                user_id,
                direction,
                state,
            } => direction.includes(invite, user_id) && state.map_or(true, |s| invite.state == s),
            OrgInviteQuery::Org { org_id, state } => {
                invite.org_id == org_id && state.map_or(true, |s| invite.state == s)
            }
        }
    }
}

/// Platform invite a dormant org invite should be linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformInviteTarget {
    /// An existing, pending platform invite.
    Existing(Uuid),
    /// The live pending invite for this candidate's email, or the candidate
    /// itself when there is none.
    ReuseOrCreate(PlatformInvite),
}

/// Access key persistence. Keys are addressed by `(issuer_id, key_id)`.
#[async_trait]
pub trait KeyRepository: Send + Sync {
    /// Persist key metadata. `Conflict` when the key already exists.
    async fn save_key(&self, key: Key) -> AuthResult<()>;

    /// `NotFound` when absent for this issuer.
    async fn retrieve_key(&self, issuer_id: Uuid, key_id: Uuid) -> AuthResult<Key>;

    /// Idempotent removal.
    async fn remove_key(&self, issuer_id: Uuid, key_id: Uuid) -> AuthResult<()>;
}

/// Platform role assignments, one per user.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// `Conflict` when the user already has a role.
    async fn assign_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()>;

    /// `None` when the user has no role.
    async fn retrieve_role(&self, user_id: Uuid) -> AuthResult<Option<PlatformRole>>;

    /// `NotFound` when the user has no role.
    async fn update_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()>;

    /// Idempotent removal.
    async fn remove_role(&self, user_id: Uuid) -> AuthResult<()>;
}

/// Organizations and their group associations.
#[async_trait]
pub trait OrgRepository: Send + Sync {
    /// `Conflict` when the ID is taken.
    async fn save_org(&self, org: Org) -> AuthResult<()>;

    /// Replace a stored organization. `NotFound` when absent.
    async fn update_org(&self, org: Org) -> AuthResult<()>;

    async fn retrieve_org(&self, id: Uuid) -> AuthResult<Org>;

    /// Filtered listing sorted by ID. With `visible_to`, only organizations
    /// the user owns or belongs to are returned.
    async fn list_orgs(
        &self,
        filter: &OrgFilter,
        visible_to: Option<Uuid>,
        page: Page,
    ) -> AuthResult<Paged<Org>>;

    /// Delete organizations.
    ///
    /// Absent IDs are skipped. `OrgNotEmpty` when any target is still
    /// referenced by a membership or a group association, in which case
    /// nothing is removed. Invites of removed orgs go with them.
    async fn remove_orgs(&self, ids: &[Uuid]) -> AuthResult<()>;

    /// Associate groups with an organization. Groups already associated with
    /// this org are skipped; `Conflict` when one belongs to another org.
    async fn assign_groups(&self, org_id: Uuid, group_ids: &[Uuid]) -> AuthResult<()>;

    /// Drop group associations and the group memberships hanging off them.
    async fn unassign_groups(&self, org_id: Uuid, group_ids: &[Uuid]) -> AuthResult<()>;

    /// Association of a single group. `NotFound` when it belongs to no org.
    async fn retrieve_group(&self, group_id: Uuid) -> AuthResult<OrgGroup>;

    /// Group associations of an organization, sorted by group ID.
    async fn list_groups(&self, org_id: Uuid, page: Page) -> AuthResult<Paged<OrgGroup>>;
}

/// Org and group memberships.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Insert memberships atomically. `Conflict` on a duplicate pair or a
    /// missing organization.
    async fn save_memberships(&self, rows: Vec<OrgMembership>) -> AuthResult<()>;

    async fn retrieve_membership(&self, org_id: Uuid, member_id: Uuid)
        -> AuthResult<OrgMembership>;

    /// Memberships of an organization sorted by member ID.
    async fn list_memberships(&self, org_id: Uuid, page: Page) -> AuthResult<Paged<OrgMembership>>;

    /// Change roles atomically. `NotFound` when any pair is missing.
    async fn update_memberships(
        &self,
        org_id: Uuid,
        rows: &[MemberRole],
        now: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Remove memberships atomically. Absent pairs are no-ops.
    async fn remove_memberships(&self, org_id: Uuid, member_ids: &[Uuid]) -> AuthResult<()>;

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

    /// Snapshot of organizations, memberships and group data.
    async fn backup(&self) -> AuthResult<Backup>;

    /// Re-insert a snapshot. Rows already present are skipped.
    async fn restore(&self, backup: Backup) -> AuthResult<()>;

    /// Memberships of one organization, sorted by member ID.
    async fn backup_org_memberships(&self, org_id: Uuid) -> AuthResult<Vec<OrgMembership>>;

    /// Re-insert memberships of one organization. Rows already present are
    /// skipped; `MalformedEntity` when a row belongs to another org.
    async fn restore_org_memberships(&self, org_id: Uuid, rows: Vec<OrgMembership>)
        -> AuthResult<()>;
}

/// Org invites, platform invites and the links between them.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Persist the expiry projection for pending org invites in `scope`.
    /// A dormant invite expires once its platform invite can no longer be
    /// accepted. Returns the number of rows flipped to expired.
    async fn sync_org_invite_expiry(&self, scope: OrgInviteScope, now: DateTime<Utc>)
        -> AuthResult<usize>;

    /// Persist the expiry projection for pending platform invites in `scope`,
    /// expiring the pending dormant invites linked to each lapsed one.
    /// Returns the number of platform invites flipped to expired.
    async fn sync_platform_invite_expiry(
        &self,
        scope: PlatformInviteScope,
        now: DateTime<Utc>,
    ) -> AuthResult<usize>;

    /// Insert an addressed org invite. `Conflict` when the (invitee, org)
    /// slot already holds a pending invite or the org is missing.
    async fn save_org_invite(&self, invite: OrgInvite) -> AuthResult<()>;

    /// Insert a dormant org invite and link it to a platform invite, creating
    /// that platform invite when needed. Returns the linked platform invite.
    async fn save_dormant_org_invite(
        &self,
        invite: OrgInvite,
        target: PlatformInviteTarget,
    ) -> AuthResult<PlatformInvite>;

    async fn retrieve_org_invite(&self, id: Uuid) -> AuthResult<OrgInvite>;

    /// Listing sorted by ID.
    async fn list_org_invites(&self, query: OrgInviteQuery, page: Page)
        -> AuthResult<Paged<OrgInvite>>;

    /// Move a pending invite to accepted or declined. Acceptance inserts the
    /// membership and group grants in the same step. `Conflict` when the
    /// invite is not pending, is dormant, or the membership exists.
    async fn respond_org_invite(
        &self,
        id: Uuid,
        accept: bool,
        now: DateTime<Utc>,
    ) -> AuthResult<OrgInvite>;

    /// Hard delete, removing any dormant link. Idempotent.
    async fn remove_org_invite(&self, id: Uuid) -> AuthResult<()>;

    /// Resolve every dormant invite linked to a platform invite: set the
    /// invitee, re-arm expiry, consume the links. Returns the activated
    /// invites, empty once the links are gone.
    async fn activate_org_invites(
        &self,
        platform_invite_id: Uuid,
        invitee_id: Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<Vec<OrgInvite>>;

    /// `Conflict` when a pending invite exists for the same email.
    async fn save_platform_invite(&self, invite: PlatformInvite) -> AuthResult<()>;

    async fn retrieve_platform_invite(&self, id: Uuid) -> AuthResult<PlatformInvite>;

    /// Filtered listing sorted by ID.
    async fn list_platform_invites(
        &self,
        filter: &PlatformInviteFilter,
    ) -> AuthResult<Paged<PlatformInvite>>;

    /// Move a pending platform invite addressed to `email` to accepted.
    async fn accept_platform_invite(
        &self,
        id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<PlatformInvite>;

    /// Hard delete, cascading to linked dormant org invites. Idempotent.
    async fn remove_platform_invite(&self, id: Uuid) -> AuthResult<()>;
}

/// Everything the service layer needs from persistence.
pub trait Store:
    KeyRepository + RoleRepository + OrgRepository + MembershipRepository + InviteRepository
{
}

impl<T> Store for T where
    T: KeyRepository + RoleRepository + OrgRepository + MembershipRepository + InviteRepository
{
}
