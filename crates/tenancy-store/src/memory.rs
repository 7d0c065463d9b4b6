//! In-memory store implementation.
//!
//! All tables sit behind a single `RwLock`. Every mutating operation takes the
//! write lock once, validates all rows, and only then applies them, so a
//! failed batch leaves no trace and concurrent readers never observe a
//! partially applied one.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tenancy_auth::{AuthError, AuthResult, Key};
use tenancy_org::{
    Backup, DormantOrgInviteLink, GroupMembership, InviteState, MemberRole, Org, OrgFilter,
    OrgGroup, OrgInvite, OrgMembership, Page, Paged, PlatformInvite, PlatformInviteFilter,
};
use tenancy_rbac::{MembershipRole, PlatformRole};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::repository::{
    InviteRepository, KeyRepository, MembershipRepository, OrgInviteQuery, OrgInviteScope,
    OrgRepository, PlatformInviteScope, PlatformInviteTarget, RoleRepository,
};

#[derive(Debug, Default)]
struct Tables {
    /// Keyed by (issuer_id, key_id)
    keys: HashMap<(Uuid, Uuid), Key>,
    roles: HashMap<Uuid, PlatformRole>,
    orgs: BTreeMap<Uuid, Org>,
    /// Keyed by (org_id, member_id)
    memberships: BTreeMap<(Uuid, Uuid), OrgMembership>,
    /// Keyed by group_id; a group belongs to at most one org
    org_groups: BTreeMap<Uuid, OrgGroup>,
    /// Keyed by (group_id, member_id)
    group_memberships: BTreeMap<(Uuid, Uuid), GroupMembership>,
    org_invites: BTreeMap<Uuid, OrgInvite>,
    platform_invites: BTreeMap<Uuid, PlatformInvite>,
    /// Keyed by org_invite_id
    dormant_links: BTreeMap<Uuid, DormantOrgInviteLink>,
}

impl Tables {
    fn memberships_of(&self, org_id: Uuid) -> impl Iterator<Item = &OrgMembership> {
        self.memberships
            .range((org_id, Uuid::nil())..=(org_id, Uuid::from_u128(u128::MAX)))
            .map(|(_, membership)| membership)
    }

    fn is_org_empty(&self, org_id: Uuid) -> bool {
        self.memberships_of(org_id).next().is_none()
            && !self.org_groups.values().any(|g| g.org_id == org_id)
    }

    fn can_see_org(&self, org: &Org, user_id: Uuid) -> bool {
        org.owner_id == user_id || self.memberships.contains_key(&(org.id, user_id))
    }

    fn pending_slot_taken(&self, invitee_id: Uuid, org_id: Uuid) -> bool {
        self.org_invites.values().any(|invite| {
            invite.invitee_id == Some(invitee_id)
                && invite.org_id == org_id
                && invite.state == InviteState::Pending
        })
    }

    fn pending_platform_invite(&self, email: &str) -> Option<&PlatformInvite> {
        self.platform_invites
            .values()
            .find(|invite| invite.invitee_email == email && invite.state == InviteState::Pending)
    }

    fn pending_dormant_exists(&self, platform_invite_id: Uuid, org_id: Uuid) -> bool {
        self.dormant_links
            .values()
            .filter(|link| link.platform_invite_id == platform_invite_id)
            .filter_map(|link| self.org_invites.get(&link.org_invite_id))
            .any(|invite| invite.org_id == org_id && invite.state == InviteState::Pending)
    }

    fn remove_org_invite(&mut self, id: Uuid) {
        self.org_invites.remove(&id);
        self.dormant_links.remove(&id);
    }

    /// State of a pending dormant invite at `now`. It lapses once its
    /// platform invite can no longer be accepted.
    fn dormant_state(&self, invite: &OrgInvite, now: DateTime<Utc>) -> InviteState {
        if invite.state != InviteState::Pending {
            return invite.state;
        }
        let platform_state = self
            .dormant_links
            .get(&invite.id)
            .and_then(|link| self.platform_invites.get(&link.platform_invite_id))
            .map(|platform_invite| platform_invite.effective_state(now));
        match platform_state {
            Some(InviteState::Pending | InviteState::Accepted) => InviteState::Pending,
            _ => InviteState::Expired,
        }
    }
}

/// In-memory store.
///
/// Suitable for tests and single-process deployments. Cloning yields another
/// handle to the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyRepository for MemoryStore {
    async fn save_key(&self, key: Key) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        let pk = (key.issuer_id, key.id);
        if tables.keys.contains_key(&pk) {
            return Err(AuthError::conflict(format!("key {} already exists", key.id)));
        }
        tables.keys.insert(pk, key);
        Ok(())
    }

    async fn retrieve_key(&self, issuer_id: Uuid, key_id: Uuid) -> AuthResult<Key> {
        let tables = self.tables.read().await;
        tables
            .keys
            .get(&(issuer_id, key_id))
            .cloned()
            .ok_or_else(|| AuthError::not_found(format!("key {}", key_id)))
    }

    async fn remove_key(&self, issuer_id: Uuid, key_id: Uuid) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        tables.keys.remove(&(issuer_id, key_id));
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn assign_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        if tables.roles.contains_key(&user_id) {
            return Err(AuthError::conflict(format!("user {} already has a role", user_id)));
        }
        tables.roles.insert(user_id, role);
        Ok(())
    }

    async fn retrieve_role(&self, user_id: Uuid) -> AuthResult<Option<PlatformRole>> {
        Ok(self.tables.read().await.roles.get(&user_id).copied())
    }

    async fn update_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        match tables.roles.get_mut(&user_id) {
            Some(current) => {
                *current = role;
                Ok(())
            }
            None => Err(AuthError::not_found(format!("role of user {}", user_id))),
        }
    }

    async fn remove_role(&self, user_id: Uuid) -> AuthResult<()> {
        self.tables.write().await.roles.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl OrgRepository for MemoryStore {
    async fn save_org(&self, org: Org) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        if tables.orgs.contains_key(&org.id) {
            return Err(AuthError::conflict(format!("organization {} already exists", org.id)));
        }
        tables.orgs.insert(org.id, org);
        Ok(())
    }

    async fn update_org(&self, org: Org) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        match tables.orgs.get_mut(&org.id) {
            Some(current) => {
                *current = org;
                Ok(())
            }
            None => Err(AuthError::not_found(format!("organization {}", org.id))),
        }
    }

    async fn retrieve_org(&self, id: Uuid) -> AuthResult<Org> {
        let tables = self.tables.read().await;
        tables
            .orgs
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthError::not_found(format!("organization {}", id)))
    }

    async fn list_orgs(
        &self,
        filter: &OrgFilter,
        visible_to: Option<Uuid>,
        page: Page,
    ) -> AuthResult<Paged<Org>> {
        let tables = self.tables.read().await;
        let orgs = tables
            .orgs
            .values()
            .filter(|org| visible_to.map_or(true, |user_id| tables.can_see_org(org, user_id)))
            .filter(|org| filter.matches(org))
            .cloned()
            .collect();
        Ok(page.slice(orgs))
    }

    async fn remove_orgs(&self, ids: &[Uuid]) -> AuthResult<()> {
        let mut tables = self.tables.write().await;

        for id in ids {
            if tables.orgs.contains_key(id) && !tables.is_org_empty(*id) {
                return Err(AuthError::OrgNotEmpty(id.to_string()));
            }
        }

        for id in ids {
            if tables.orgs.remove(id).is_none() {
                continue;
            }
            let invites: Vec<Uuid> = tables
                .org_invites
                .values()
                .filter(|invite| invite.org_id == *id)
                .map(|invite| invite.id)
                .collect();
            for invite_id in &invites {
                tables.remove_org_invite(*invite_id);
            }
            debug!(org_id = %id, invites = invites.len(), "Removed organization");
        }

        Ok(())
    }

    async fn assign_groups(&self, org_id: Uuid, group_ids: &[Uuid]) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.orgs.contains_key(&org_id) {
            return Err(AuthError::not_found(format!("organization {}", org_id)));
        }

        for group_id in group_ids {
            if let Some(existing) = tables.org_groups.get(group_id) {
                if existing.org_id != org_id {
                    return Err(AuthError::conflict(format!(
                        "group {} belongs to another organization",
                        group_id
                    )));
                }
            }
        }

        for group_id in group_ids {
            tables
                .org_groups
                .entry(*group_id)
                .or_insert_with(|| OrgGroup::new(org_id, *group_id));
        }
        Ok(())
    }

    async fn unassign_groups(&self, org_id: Uuid, group_ids: &[Uuid]) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        for group_id in group_ids {
            let owned = tables
                .org_groups
                .get(group_id)
                .is_some_and(|group| group.org_id == org_id);
            if owned {
                tables.org_groups.remove(group_id);
                tables
                    .group_memberships
                    .retain(|(gid, _), _| gid != group_id);
            }
        }
        Ok(())
    }

    async fn retrieve_group(&self, group_id: Uuid) -> AuthResult<OrgGroup> {
        let tables = self.tables.read().await;
        tables
            .org_groups
            .get(&group_id)
            .copied()
            .ok_or_else(|| AuthError::not_found(format!("group {}", group_id)))
    }

    async fn list_groups(&self, org_id: Uuid, page: Page) -> AuthResult<Paged<OrgGroup>> {
        let tables = self.tables.read().await;
        let groups = tables
            .org_groups
            .values()
            .filter(|group| group.org_id == org_id)
            .copied()
            .collect();
        Ok(page.slice(groups))
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn save_memberships(&self, rows: Vec<OrgMembership>) -> AuthResult<()> {
        let mut tables = self.tables.write().await;

        let mut batch = HashSet::new();
        for row in &rows {
            if !tables.orgs.contains_key(&row.org_id) {
                return Err(AuthError::conflict(format!(
                    "organization {} does not exist",
                    row.org_id
                )));
            }
            if tables.memberships.contains_key(&row.key()) || !batch.insert(row.key()) {
                return Err(AuthError::conflict(format!(
                    "member {} already belongs to organization {}",
                    row.member_id, row.org_id
                )));
            }
        }

        let count = rows.len();
        for row in rows {
            tables.memberships.insert(row.key(), row);
        }
        debug!(count, "Saved memberships");
        Ok(())
    }

    async fn retrieve_membership(
        &self,
        org_id: Uuid,
        member_id: Uuid,
    ) -> AuthResult<OrgMembership> {
        let tables = self.tables.read().await;
        tables
            .memberships
            .get(&(org_id, member_id))
            .cloned()
            .ok_or_else(|| {
                AuthError::not_found(format!("membership of {} in {}", member_id, org_id))
            })
    }

    async fn list_memberships(
        &self,
        org_id: Uuid,
        page: Page,
    ) -> AuthResult<Paged<OrgMembership>> {
        let tables = self.tables.read().await;
        Ok(page.slice(tables.memberships_of(org_id).cloned().collect()))
    }

    async fn update_memberships(
        &self,
        org_id: Uuid,
        rows: &[MemberRole],
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut tables = self.tables.write().await;

        for row in rows {
            if !tables.memberships.contains_key(&(org_id, row.member_id)) {
                return Err(AuthError::not_found(format!(
                    "membership of {} in {}",
                    row.member_id, org_id
                )));
            }
        }

        for row in rows {
            if let Some(membership) = tables.memberships.get_mut(&(org_id, row.member_id)) {
                membership.role = row.role;
                membership.updated_at = now;
            }
        }
        Ok(())
    }

    async fn remove_memberships(&self, org_id: Uuid, member_ids: &[Uuid]) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        for member_id in member_ids {
            tables.memberships.remove(&(org_id, *member_id));
        }
        Ok(())
    }

    async fn retrieve_member_role(
        &self,
        member_id: Uuid,
        org_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>> {
        let tables = self.tables.read().await;
        Ok(tables.memberships.get(&(org_id, member_id)).map(|m| m.role))
    }

    async fn retrieve_group_role(
        &self,
        member_id: Uuid,
        group_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>> {
        let tables = self.tables.read().await;
        Ok(tables
            .group_memberships
            .get(&(group_id, member_id))
            .map(|m| m.role))
    }

    async fn backup(&self) -> AuthResult<Backup> {
        let tables = self.tables.read().await;
        Ok(Backup {
            orgs: tables.orgs.values().cloned().collect(),
            memberships: tables.memberships.values().cloned().collect(),
            org_groups: tables.org_groups.values().copied().collect(),
            group_memberships: tables.group_memberships.values().copied().collect(),
        })
    }

    async fn restore(&self, backup: Backup) -> AuthResult<()> {
        let mut tables = self.tables.write().await;

        let restored_orgs: HashSet<Uuid> = backup.orgs.iter().map(|org| org.id).collect();
        let org_exists = |tables: &Tables, org_id: Uuid| {
            tables.orgs.contains_key(&org_id) || restored_orgs.contains(&org_id)
        };

        for membership in &backup.memberships {
            if !org_exists(&*tables, membership.org_id) {
                return Err(AuthError::conflict(format!(
                    "organization {} does not exist",
                    membership.org_id
                )));
            }
        }
        for group in &backup.org_groups {
            if !org_exists(&*tables, group.org_id) {
                return Err(AuthError::conflict(format!(
                    "organization {} does not exist",
                    group.org_id
                )));
            }
            if let Some(existing) = tables.org_groups.get(&group.group_id) {
                if existing.org_id != group.org_id {
                    return Err(AuthError::conflict(format!(
                        "group {} belongs to another organization",
                        group.group_id
                    )));
                }
            }
        }

        for org in backup.orgs {
            tables.orgs.entry(org.id).or_insert(org);
        }
        for membership in backup.memberships {
            tables.memberships.entry(membership.key()).or_insert(membership);
        }
        for group in backup.org_groups {
            tables.org_groups.entry(group.group_id).or_insert(group);
        }
        for membership in backup.group_memberships {
            tables
                .group_memberships
                .entry(membership.key())
                .or_insert(membership);
        }
        Ok(())
    }

    async fn backup_org_memberships(&self, org_id: Uuid) -> AuthResult<Vec<OrgMembership>> {
        let tables = self.tables.read().await;
        Ok(tables.memberships_of(org_id).cloned().collect())
    }

    async fn restore_org_memberships(
        &self,
        org_id: Uuid,
        rows: Vec<OrgMembership>,
    ) -> AuthResult<()> {
        let mut tables = self.tables.write().await;

        if !tables.orgs.contains_key(&org_id) {
            return Err(AuthError::not_found(format!("organization {}", org_id)));
        }
        if let Some(row) = rows.iter().find(|row| row.org_id != org_id) {
            return Err(AuthError::malformed(format!(
                "membership of {} belongs to organization {}",
                row.member_id, row.org_id
            )));
        }

        for row in rows {
            tables.memberships.entry(row.key()).or_insert(row);
        }
        Ok(())
    }
}

#[async_trait]
impl InviteRepository for MemoryStore {
    async fn sync_org_invite_expiry(
        &self,
        scope: OrgInviteScope,
        now: DateTime<Utc>,
    ) -> AuthResult<usize> {
        let mut tables = self.tables.write().await;
        let changes: Vec<(Uuid, InviteState)> = tables
            .org_invites
            .values()
            .filter(|invite| scope.contains(invite))
            .filter_map(|invite| {
                let state = if invite.is_dormant() {
                    tables.dormant_state(invite, now)
                } else {
                    invite.effective_state(now)
                };
                (state != invite.state).then_some((invite.id, state))
            })
            .collect();

        let expired = changes.len();
        for (id, state) in changes {
            if let Some(invite) = tables.org_invites.get_mut(&id) {
                invite.state = state;
                invite.updated_at = now;
            }
        }
        if expired > 0 {
            debug!(?scope, expired, "Expired org invites");
        }
        Ok(expired)
    }

    async fn sync_platform_invite_expiry(
        &self,
        scope: PlatformInviteScope,
        now: DateTime<Utc>,
    ) -> AuthResult<usize> {
        let mut tables = self.tables.write().await;
        let tables = &mut *tables;
        let mut lapsed = HashSet::new();
        for invite in tables.platform_invites.values_mut() {
            if !scope.contains(invite) {
                continue;
            }
            let state = invite.effective_state(now);
            if state != invite.state {
                invite.state = state;
                invite.updated_at = now;
                lapsed.insert(invite.id);
            }
        }
        if lapsed.is_empty() {
            return Ok(0);
        }

        let mut dormant = 0;
        for link in tables
            .dormant_links
            .values()
            .filter(|link| lapsed.contains(&link.platform_invite_id))
        {
            if let Some(invite) = tables.org_invites.get_mut(&link.org_invite_id) {
                if invite.state == InviteState::Pending {
                    invite.state = InviteState::Expired;
                    invite.updated_at = now;
                    dormant += 1;
                }
            }
        }
        debug!(?scope, expired = lapsed.len(), dormant, "Expired platform invites");
        Ok(lapsed.len())
    }

    async fn save_org_invite(&self, invite: OrgInvite) -> AuthResult<()> {
        let mut tables = self.tables.write().await;

        let Some(invitee_id) = invite.invitee_id else {
            return Err(AuthError::malformed("org invite without invitee"));
        };
        if !tables.orgs.contains_key(&invite.org_id) {
            return Err(AuthError::conflict(format!(
                "organization {} does not exist",
                invite.org_id
            )));
        }
        if tables.org_invites.contains_key(&invite.id) {
            return Err(AuthError::conflict(format!("invite {} already exists", invite.id)));
        }
        if tables.pending_slot_taken(invitee_id, invite.org_id) {
            return Err(AuthError::conflict(format!(
                "a pending invite for {} in {} already exists",
                invitee_id, invite.org_id
            )));
        }

        tables.org_invites.insert(invite.id, invite);
        Ok(())
    }

    async fn save_dormant_org_invite(
        &self,
        invite: OrgInvite,
        target: PlatformInviteTarget,
    ) -> AuthResult<PlatformInvite> {
        let mut tables = self.tables.write().await;

        if !invite.is_dormant() {
            return Err(AuthError::malformed("dormant org invite with an invitee"));
        }
        if !tables.orgs.contains_key(&invite.org_id) {
            return Err(AuthError::conflict(format!(
                "organization {} does not exist",
                invite.org_id
            )));
        }
        if tables.org_invites.contains_key(&invite.id) {
            return Err(AuthError::conflict(format!("invite {} already exists", invite.id)));
        }

        let (platform_invite, created) = match target {
            PlatformInviteTarget::Existing(id) => {
                let existing = tables
                    .platform_invites
                    .get(&id)
                    .ok_or_else(|| AuthError::not_found(format!("platform invite {}", id)))?;
                if existing.state != InviteState::Pending {
                    return Err(AuthError::conflict(format!(
                        "platform invite {} is {}",
                        id, existing.state
                    )));
                }
                (existing.clone(), false)
            }
            PlatformInviteTarget::ReuseOrCreate(candidate) => {
                match tables.pending_platform_invite(&candidate.invitee_email) {
                    Some(existing) => (existing.clone(), false),
                    None => {
                        if tables.platform_invites.contains_key(&candidate.id) {
                            return Err(AuthError::conflict(format!(
                                "platform invite {} already exists",
                                candidate.id
                            )));
                        }
                        (candidate, true)
                    }
                }
            }
        };

        if tables.pending_dormant_exists(platform_invite.id, invite.org_id) {
            return Err(AuthError::conflict(format!(
                "a pending invite for platform invite {} in {} already exists",
                platform_invite.id, invite.org_id
            )));
        }

        let link = DormantOrgInviteLink::new(invite.id, platform_invite.id);
        if created {
            tables
                .platform_invites
                .insert(platform_invite.id, platform_invite.clone());
        }
        tables.dormant_links.insert(invite.id, link);
        tables.org_invites.insert(invite.id, invite);

        Ok(platform_invite)
    }

    async fn retrieve_org_invite(&self, id: Uuid) -> AuthResult<OrgInvite> {
        let tables = self.tables.read().await;
        tables
            .org_invites
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthError::not_found(format!("org invite {}", id)))
    }

    async fn list_org_invites(
        &self,
        query: OrgInviteQuery,
        page: Page,
    ) -> AuthResult<Paged<OrgInvite>> {
        let tables = self.tables.read().await;
        let invites = tables
            .org_invites
            .values()
            .filter(|invite| query.matches(invite))
            .cloned()
            .collect();
        Ok(page.slice(invites))
    }

    async fn respond_org_invite(
        &self,
        id: Uuid,
        accept: bool,
        now: DateTime<Utc>,
    ) -> AuthResult<OrgInvite> {
        let mut tables = self.tables.write().await;

        let invite = tables
            .org_invites
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthError::not_found(format!("org invite {}", id)))?;
        let Some(invitee_id) = invite.invitee_id else {
            return Err(AuthError::conflict(format!("org invite {} is not activated", id)));
        };
        if invite.state != InviteState::Pending {
            return Err(AuthError::conflict(format!("org invite {} is {}", id, invite.state)));
        }

        if accept {
            if !tables.orgs.contains_key(&invite.org_id) {
                return Err(AuthError::not_found(format!("organization {}", invite.org_id)));
            }
            let key = (invite.org_id, invitee_id);
            if tables.memberships.contains_key(&key) {
                return Err(AuthError::conflict(format!(
                    "member {} already belongs to organization {}",
                    invitee_id, invite.org_id
                )));
            }

            tables.memberships.insert(
                key,
                OrgMembership::new(invite.org_id, invitee_id, invite.invitee_role, now),
            );
            for grant in &invite.groups {
                let associated = tables
                    .org_groups
                    .get(&grant.group_id)
                    .is_some_and(|group| group.org_id == invite.org_id);
                if associated {
                    let membership = grant.for_member(invitee_id);
                    tables
                        .group_memberships
                        .entry(membership.key())
                        .or_insert(membership);
                } else {
                    warn!(
                        invite_id = %id,
                        group_id = %grant.group_id,
                        org_id = %invite.org_id,
                        "Skipped group grant for a group no longer in the organization"
                    );
                }
            }
        }

        let state = if accept {
            InviteState::Accepted
        } else {
            InviteState::Declined
        };
        let stored = tables
            .org_invites
            .get_mut(&id)
            .ok_or_else(|| AuthError::Internal(format!("org invite {} vanished", id)))?;
        stored.state = state;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn remove_org_invite(&self, id: Uuid) -> AuthResult<()> {
        self.tables.write().await.remove_org_invite(id);
        Ok(())
    }

    async fn activate_org_invites(
        &self,
        platform_invite_id: Uuid,
        invitee_id: Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<Vec<OrgInvite>> {
        let mut tables = self.tables.write().await;

        let invite_ids: Vec<Uuid> = tables
            .dormant_links
            .values()
            .filter(|link| link.platform_invite_id == platform_invite_id)
            .map(|link| link.org_invite_id)
            .collect();
        if invite_ids.is_empty() {
            return Ok(Vec::new());
        }

        let platform_state = tables
            .platform_invites
            .get(&platform_invite_id)
            .map(|invite| invite.state);
        if platform_state != Some(InviteState::Accepted) {
            return Err(AuthError::conflict(format!(
                "platform invite {} has not been accepted",
                platform_invite_id
            )));
        }

        let mut orgs = HashSet::new();
        for invite_id in &invite_ids {
            let invite = tables
                .org_invites
                .get(invite_id)
                .ok_or_else(|| AuthError::Internal(format!("dangling link to {}", invite_id)))?;
            if tables.pending_slot_taken(invitee_id, invite.org_id) || !orgs.insert(invite.org_id)
            {
                return Err(AuthError::conflict(format!(
                    "a pending invite for {} in {} already exists",
                    invitee_id, invite.org_id
                )));
            }
        }

        let mut activated = Vec::with_capacity(invite_ids.len());
        for invite_id in &invite_ids {
            tables.dormant_links.remove(invite_id);
            if let Some(invite) = tables.org_invites.get_mut(invite_id) {
                invite.invitee_id = Some(invitee_id);
                invite.expires_at = expires_at;
                invite.updated_at = now;
                activated.push(invite.clone());
            }
        }

        debug!(
            platform_invite_id = %platform_invite_id,
            invitee_id = %invitee_id,
            count = activated.len(),
            "Activated dormant org invites"
        );
        Ok(activated)
    }

    async fn save_platform_invite(&self, invite: PlatformInvite) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        if tables.platform_invites.contains_key(&invite.id) {
            return Err(AuthError::conflict(format!(
                "platform invite {} already exists",
                invite.id
            )));
        }
        if tables.pending_platform_invite(&invite.invitee_email).is_some() {
            return Err(AuthError::conflict(format!(
                "a pending platform invite for {} already exists",
                invite.invitee_email
            )));
        }
        tables.platform_invites.insert(invite.id, invite);
        Ok(())
    }

    async fn retrieve_platform_invite(&self, id: Uuid) -> AuthResult<PlatformInvite> {
        let tables = self.tables.read().await;
        tables
            .platform_invites
            .get(&id)
            .cloned()
            .ok_or_else(|| AuthError::not_found(format!("platform invite {}", id)))
    }

    async fn list_platform_invites(
        &self,
        filter: &PlatformInviteFilter,
    ) -> AuthResult<Paged<PlatformInvite>> {
        let tables = self.tables.read().await;
        let invites = tables
            .platform_invites
            .values()
            .filter(|invite| filter.matches(invite))
            .cloned()
            .collect();
        Ok(filter.page.slice(invites))
    }

    async fn accept_platform_invite(
        &self,
        id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<PlatformInvite> {
        let mut tables = self.tables.write().await;
        let invite = tables
            .platform_invites
            .get_mut(&id)
            .filter(|invite| invite.invitee_email == email)
            .ok_or_else(|| AuthError::not_found(format!("platform invite {} for {}", id, email)))?;

        if invite.state != InviteState::Pending {
            return Err(AuthError::conflict(format!(
                "platform invite {} is {}",
                id, invite.state
            )));
        }

        invite.state = InviteState::Accepted;
        invite.updated_at = now;
        Ok(invite.clone())
    }

    async fn remove_platform_invite(&self, id: Uuid) -> AuthResult<()> {
        let mut tables = self.tables.write().await;
        if tables.platform_invites.remove(&id).is_none() {
            return Ok(());
        }

        let dormant: Vec<Uuid> = tables
            .dormant_links
            .values()
            .filter(|link| link.platform_invite_id == id)
            .map(|link| link.org_invite_id)
            .collect();
        for invite_id in &dormant {
            tables.remove_org_invite(*invite_id);
        }
        debug!(platform_invite_id = %id, dormant = dormant.len(), "Removed platform invite");
        Ok(())
    }
}
