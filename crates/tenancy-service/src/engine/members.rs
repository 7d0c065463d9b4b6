use async_trait::async_trait;
use tenancy_auth::AuthResult;
use tenancy_org::{Backup, MemberRole, OrgMembership, Page, Paged};
use tenancy_rbac::{Action, MembershipRole, ResourceType};
use tenancy_store::MembershipRepository;
use tracing::{info, instrument};
use uuid::Uuid;

use super::AuthCore;
use crate::service::MembershipService;

#[async_trait]
impl MembershipService for AuthCore {
    #[instrument(skip(self, token, members), fields(count = members.len()))]
    async fn create_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        members: Vec<MemberRole>,
    ) -> AuthResult<Vec<OrgMembership>> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Membership, Action::Create)
            .await?;

        let now = self.now();
        let rows: Vec<OrgMembership> = members
            .into_iter()
            .map(|member| member.into_membership(org_id, now))
            .collect();
        self.store.save_memberships(rows.clone()).await?;

        info!(count = rows.len(), "Created memberships");
        Ok(rows)
    }

    async fn view_org_membership(
        &self,
        token: &str,
        org_id: Uuid,
        member_id: Uuid,
    ) -> AuthResult<OrgMembership> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Membership, Action::Read)
            .await?;
        self.store.retrieve_membership(org_id, member_id).await
    }

    async fn list_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        page: Page,
    ) -> AuthResult<Paged<OrgMembership>> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Membership, Action::List)
            .await?;
        self.store.list_memberships(org_id, page).await
    }

    #[instrument(skip(self, token, members), fields(count = members.len()))]
    async fn update_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        members: &[MemberRole],
    ) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Membership, Action::Update)
            .await?;
        self.store
            .update_memberships(org_id, members, self.now())
            .await
    }

    #[instrument(skip(self, token, member_ids), fields(count = member_ids.len()))]
    async fn remove_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        member_ids: &[Uuid],
    ) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Membership, Action::Delete)
            .await?;
        self.store.remove_memberships(org_id, member_ids).await
    }

    async fn retrieve_member_role(
        &self,
        member_id: Uuid,
        org_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>> {
        self.store.retrieve_member_role(member_id, org_id).await
    }

    async fn retrieve_group_role(
        &self,
        member_id: Uuid,
        group_id: Uuid,
    ) -> AuthResult<Option<MembershipRole>> {
        self.store.retrieve_group_role(member_id, group_id).await
    }

    #[instrument(skip(self, token))]
    async fn backup(&self, token: &str) -> AuthResult<Backup> {
        let caller = self.caller(token).await?;
        self.authorize_platform(&caller, ResourceType::Backup, Action::Read)?;
        self.store.backup().await
    }

    #[instrument(skip(self, token, backup))]
    async fn restore(&self, token: &str, backup: Backup) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.authorize_platform(&caller, ResourceType::Backup, Action::Create)?;
        self.store.restore(backup).await
    }

    async fn backup_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
    ) -> AuthResult<Vec<OrgMembership>> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Membership, Action::Manage)
            .await?;
        self.store.backup_org_memberships(org_id).await
    }

    #[instrument(skip(self, token, rows), fields(count = rows.len()))]
    async fn restore_org_memberships(
        &self,
        token: &str,
        org_id: Uuid,
        rows: Vec<OrgMembership>,
    ) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Membership, Action::Manage)
            .await?;
        self.store.restore_org_memberships(org_id, rows).await
    }
}
