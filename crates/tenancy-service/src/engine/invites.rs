//! Invite engine.
//!
//! Expiry is lazy. Every operation whose outcome depends on an invite's
//! current state first persists the expiry projection for the rows it is
//! about to touch (`sync_*_expiry`), then runs, then projects whatever it
//! returns. Dormant org invites ignore their own expiry: they lapse when the
//! platform invite they are linked to does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tenancy_auth::{AuthError, AuthResult};
use tenancy_org::{
    normalize_email, GroupGrant, InviteFilter, Invitee, NewOrgInvite, Org, OrgInvite, Paged,
    PlatformInvite, PlatformInviteFilter,
};
use tenancy_rbac::{Action, MembershipRole, ResourceType};
use tenancy_store::{
    InviteRepository, MembershipRepository, OrgInviteQuery, OrgInviteScope, OrgRepository,
    PlatformInviteScope, PlatformInviteTarget,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{AuthCore, Caller};
use crate::service::InviteService;

impl AuthCore {
    async fn sync_org_invites(&self, scope: OrgInviteScope, now: DateTime<Utc>) -> AuthResult<()> {
        let expired = self.store.sync_org_invite_expiry(scope, now).await?;
        if expired > 0 {
            debug!(?scope, expired, "Synced org invite expiry");
        }
        Ok(())
    }

    async fn sync_platform_invites(
        &self,
        scope: PlatformInviteScope,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let expired = self.store.sync_platform_invite_expiry(scope, now).await?;
        if expired > 0 {
            debug!(expired, "Synced platform invite expiry");
        }
        Ok(())
    }

    /// Addressed invite for an existing user.
    async fn invite_member(
        &self,
        caller: &Caller,
        org: &Org,
        invitee_id: Uuid,
        role: MembershipRole,
        groups: Vec<GroupGrant>,
        redirect_path: &str,
    ) -> AuthResult<OrgInvite> {
        if self
            .store
            .retrieve_member_role(invitee_id, org.id)
            .await?
            .is_some()
        {
            return Err(AuthError::conflict(format!(
                "user {} is already a member of organization {}",
                invitee_id, org.id
            )));
        }

        let now = self.now();
        self.sync_org_invites(
            OrgInviteScope::Slot {
                invitee_id,
                org_id: org.id,
            },
            now,
        )
        .await?;

        let invite = OrgInvite::new(
            caller.id(),
            Some(invitee_id),
            org.id,
            role,
            groups,
            now,
            now + self.config.org_invite_ttl,
        );
        self.store.save_org_invite(invite.clone()).await?;
        info!(invite_id = %invite.id, org_id = %org.id, invitee_id = %invitee_id, "Created org invite");

        if let Err(e) = self.notifier.org_invite_created(&invite, redirect_path).await {
            warn!(invite_id = %invite.id, error = %e, "Failed to send org invite notification");
        }
        Ok(invite)
    }

    /// Dormant invite for an email without an account, linked to a platform
    /// invite for that email.
    async fn invite_email(
        &self,
        caller: &Caller,
        org: &Org,
        email: String,
        role: MembershipRole,
        groups: Vec<GroupGrant>,
        redirect_path: &str,
    ) -> AuthResult<OrgInvite> {
        let now = self.now();
        self.sync_platform_invites(PlatformInviteScope::Email(email.clone()), now)
            .await?;

        let candidate = PlatformInvite::new(email, now, now + self.config.platform_invite_ttl);
        let invite = OrgInvite::new(
            caller.id(),
            None,
            org.id,
            role,
            groups,
            now,
            now + self.config.org_invite_ttl,
        );
        let platform_invite = self
            .store
            .save_dormant_org_invite(invite.clone(), PlatformInviteTarget::ReuseOrCreate(candidate))
            .await?;
        info!(
            invite_id = %invite.id,
            org_id = %org.id,
            platform_invite_id = %platform_invite.id,
            "Created dormant org invite"
        );

        if let Err(e) = self
            .notifier
            .platform_invite_created(&platform_invite, redirect_path)
            .await
        {
            warn!(invite_id = %platform_invite.id, error = %e, "Failed to send platform invite notification");
        }
        Ok(invite)
    }
}

#[async_trait]
impl InviteService for AuthCore {
    #[instrument(skip(self, token, invite), fields(org_id = %invite.org_id))]
    async fn create_org_invite(
        &self,
        token: &str,
        invite: NewOrgInvite,
        redirect_path: &str,
    ) -> AuthResult<OrgInvite> {
        let caller = self.caller(token).await?;
        let org = self
            .load_org(&caller, invite.org_id, ResourceType::OrgInvite, Action::Create)
            .await?;
        self.ensure_groups(org.id, &invite.groups).await?;

        match invite.invitee {
            Invitee::Member(invitee_id) => {
                self.invite_member(&caller, &org, invitee_id, invite.role, invite.groups, redirect_path)
                    .await
            }
            Invitee::Email(email) => {
                let email = normalize_email(&email)
                    .ok_or_else(|| AuthError::malformed(format!("invalid email {:?}", email)))?;
                match self.directory.find_by_email(&email).await? {
                    Some(invitee_id) => {
                        self.invite_member(
                            &caller,
                            &org,
                            invitee_id,
                            invite.role,
                            invite.groups,
                            redirect_path,
                        )
                        .await
                    }
                    None => {
                        self.invite_email(&caller, &org, email, invite.role, invite.groups, redirect_path)
                            .await
                    }
                }
            }
        }
    }

    #[instrument(skip(self, token, groups))]
    async fn create_dormant_org_invite(
        &self,
        token: &str,
        org_id: Uuid,
        role: MembershipRole,
        platform_invite_id: Uuid,
        groups: Vec<GroupGrant>,
    ) -> AuthResult<OrgInvite> {
        let caller = self.caller(token).await?;
        let org = self
            .load_org(&caller, org_id, ResourceType::OrgInvite, Action::Create)
            .await?;
        self.ensure_groups(org.id, &groups).await?;

        let now = self.now();
        self.sync_platform_invites(PlatformInviteScope::Id(platform_invite_id), now)
            .await?;

        let invite = OrgInvite::new(
            caller.id(),
            None,
            org.id,
            role,
            groups,
            now,
            now + self.config.org_invite_ttl,
        );
        self.store
            .save_dormant_org_invite(invite.clone(), PlatformInviteTarget::Existing(platform_invite_id))
            .await?;

        info!(invite_id = %invite.id, org_id = %org.id, "Created dormant org invite");
        Ok(invite)
    }

    #[instrument(skip(self))]
    async fn activate_org_invite(
        &self,
        platform_invite_id: Uuid,
        user_id: Uuid,
        redirect_path: &str,
    ) -> AuthResult<Vec<OrgInvite>> {
        let now = self.now();
        self.sync_org_invites(OrgInviteScope::User(user_id), now)
            .await?;

        let invites = self
            .store
            .activate_org_invites(
                platform_invite_id,
                user_id,
                now,
                now + self.config.org_invite_ttl,
            )
            .await?;
        if invites.is_empty() {
            return Ok(invites);
        }

        info!(count = invites.len(), "Activated dormant org invites");
        if let Err(e) = self
            .notifier
            .org_invites_activated(&invites, redirect_path)
            .await
        {
            warn!(error = %e, "Failed to send activation notification");
        }

        Ok(invites.into_iter().map(|invite| invite.projected(now)).collect())
    }

    #[instrument(skip(self, token))]
    async fn respond_org_invite(
        &self,
        token: &str,
        invite_id: Uuid,
        accept: bool,
    ) -> AuthResult<OrgInvite> {
        let caller = self.caller(token).await?;
        let now = self.now();
        self.sync_org_invites(OrgInviteScope::Id(invite_id), now)
            .await?;

        let invite = self.store.retrieve_org_invite(invite_id).await?;
        if invite.invitee_id != Some(caller.id()) {
            return Err(AuthError::forbidden("only the invitee can respond to an invite"));
        }

        let invite = self.store.respond_org_invite(invite_id, accept, now).await?;
        info!(invite_id = %invite.id, state = %invite.state, "Responded to org invite");
        Ok(invite)
    }

    #[instrument(skip(self, token))]
    async fn revoke_org_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        let invite = match self.store.retrieve_org_invite(invite_id).await {
            Ok(invite) => invite,
            Err(AuthError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        if invite.inviter_id != caller.id() {
            let org = self.store.retrieve_org(invite.org_id).await?;
            self.authorize_org(&caller, &org, ResourceType::OrgInvite, Action::Delete)
                .await?;
        }

        self.store.remove_org_invite(invite_id).await
    }

    async fn view_org_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<OrgInvite> {
        let caller = self.caller(token).await?;
        let now = self.now();
        self.sync_org_invites(OrgInviteScope::Id(invite_id), now)
            .await?;

        let invite = self.store.retrieve_org_invite(invite_id).await?;
        let involved = invite.inviter_id == caller.id() || invite.invitee_id == Some(caller.id());
        if !involved {
            let org = self.store.retrieve_org(invite.org_id).await?;
            self.authorize_org(&caller, &org, ResourceType::OrgInvite, Action::Read)
                .await?;
        }

        Ok(invite.projected(now))
    }

    async fn list_org_invites_by_user(
        &self,
        token: &str,
        user_id: Uuid,
        filter: InviteFilter,
    ) -> AuthResult<Paged<OrgInvite>> {
        let caller = self.caller(token).await?;
        self.check(
            &caller
                .request(ResourceType::OrgInvite, Action::List)
                .with_owner(user_id),
        )?;

        let now = self.now();
        self.sync_org_invites(OrgInviteScope::User(user_id), now)
            .await?;

        let query = OrgInviteQuery::User {
            user_id,
            direction: filter.direction,
            state: filter.state,
        };
        let page = self.store.list_org_invites(query, filter.page).await?;
        Ok(page.map(|invite| invite.projected(now)))
    }

    async fn list_org_invites_by_org(
        &self,
        token: &str,
        org_id: Uuid,
        filter: InviteFilter,
    ) -> AuthResult<Paged<OrgInvite>> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::OrgInvite, Action::List)
            .await?;

        let now = self.now();
        self.sync_org_invites(OrgInviteScope::Org(org_id), now)
            .await?;

        let query = OrgInviteQuery::Org {
            org_id,
            state: filter.state,
        };
        let page = self.store.list_org_invites(query, filter.page).await?;
        Ok(page.map(|invite| invite.projected(now)))
    }

    #[instrument(skip(self, token))]
    async fn invite_platform_member(
        &self,
        token: &str,
        email: &str,
        redirect_path: &str,
    ) -> AuthResult<PlatformInvite> {
        let caller = self.caller(token).await?;
        self.authorize_platform(&caller, ResourceType::PlatformInvite, Action::Create)?;

        let email = normalize_email(email)
            .ok_or_else(|| AuthError::malformed(format!("invalid email {:?}", email)))?;
        if self.directory.find_by_email(&email).await?.is_some() {
            return Err(AuthError::conflict(format!("{} is already registered", email)));
        }

        let now = self.now();
        self.sync_platform_invites(PlatformInviteScope::Email(email.clone()), now)
            .await?;

        let invite = PlatformInvite::new(email, now, now + self.config.platform_invite_ttl);
        self.store.save_platform_invite(invite.clone()).await?;
        info!(invite_id = %invite.id, "Created platform invite");

        if let Err(e) = self
            .notifier
            .platform_invite_created(&invite, redirect_path)
            .await
        {
            warn!(invite_id = %invite.id, error = %e, "Failed to send platform invite notification");
        }
        Ok(invite)
    }

    #[instrument(skip(self, token))]
    async fn revoke_platform_invite(&self, token: &str, invite_id: Uuid) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.authorize_platform(&caller, ResourceType::PlatformInvite, Action::Delete)?;
        self.store.remove_platform_invite(invite_id).await
    }

    async fn view_platform_invite(
        &self,
        token: &str,
        invite_id: Uuid,
    ) -> AuthResult<PlatformInvite> {
        let caller = self.caller(token).await?;
        self.authorize_platform(&caller, ResourceType::PlatformInvite, Action::Read)?;

        let now = self.now();
        self.sync_platform_invites(PlatformInviteScope::Id(invite_id), now)
            .await?;
        Ok(self
            .store
            .retrieve_platform_invite(invite_id)
            .await?
            .projected(now))
    }

    async fn list_platform_invites(
        &self,
        token: &str,
        filter: PlatformInviteFilter,
    ) -> AuthResult<Paged<PlatformInvite>> {
        let caller = self.caller(token).await?;
        self.authorize_platform(&caller, ResourceType::PlatformInvite, Action::List)?;

        let now = self.now();
        self.sync_platform_invites(PlatformInviteScope::All, now)
            .await?;
        let page = self.store.list_platform_invites(&filter).await?;
        Ok(page.map(|invite| invite.projected(now)))
    }

    #[instrument(skip(self, email))]
    async fn validate_platform_invite(
        &self,
        invite_id: Uuid,
        email: &str,
    ) -> AuthResult<PlatformInvite> {
        let email = normalize_email(email)
            .ok_or_else(|| AuthError::malformed(format!("invalid email {:?}", email)))?;

        let now = self.now();
        self.sync_platform_invites(PlatformInviteScope::Id(invite_id), now)
            .await?;

        let invite = self
            .store
            .accept_platform_invite(invite_id, &email, now)
            .await?;
        info!(invite_id = %invite.id, "Accepted platform invite");
        Ok(invite)
    }
}
