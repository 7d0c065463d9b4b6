use async_trait::async_trait;
use tenancy_auth::{AuthError, AuthResult};
use tenancy_org::{NewOrg, Org, OrgFilter, OrgGroup, OrgUpdate, Page, Paged};
use tenancy_rbac::{Action, ResourceType};
use tenancy_store::OrgRepository;
use tracing::{info, instrument};
use uuid::Uuid;

use super::AuthCore;
use crate::service::OrgService;

#[async_trait]
impl OrgService for AuthCore {
    #[instrument(skip(self, token, org))]
    async fn create_org(&self, token: &str, org: NewOrg) -> AuthResult<Org> {
        let caller = self.caller(token).await?;
        let org = Org::new(org, caller.id(), self.now())
            .ok_or_else(|| AuthError::malformed("organization name must not be empty"))?;

        self.store.save_org(org.clone()).await?;
        info!(org_id = %org.id, owner_id = %org.owner_id, "Created organization");
        Ok(org)
    }

    #[instrument(skip(self, token, update))]
    async fn update_org(&self, token: &str, org_id: Uuid, update: OrgUpdate) -> AuthResult<Org> {
        let caller = self.caller(token).await?;
        let mut org = self
            .load_org(&caller, org_id, ResourceType::Organization, Action::Update)
            .await?;

        org.apply(update, self.now())
            .ok_or_else(|| AuthError::malformed("organization name must not be empty"))?;
        self.store.update_org(org.clone()).await?;
        Ok(org)
    }

    #[instrument(skip(self, token))]
    async fn remove_orgs(&self, token: &str, ids: &[Uuid]) -> AuthResult<()> {
        let caller = self.caller(token).await?;

        for id in ids {
            let org = match self.store.retrieve_org(*id).await {
                Ok(org) => org,
                Err(AuthError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            self.authorize_org(&caller, &org, ResourceType::Organization, Action::Delete)
                .await?;
        }

        self.store.remove_orgs(ids).await?;
        info!(count = ids.len(), "Removed organizations");
        Ok(())
    }

    async fn view_org(&self, token: &str, org_id: Uuid) -> AuthResult<Org> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Organization, Action::Read)
            .await
    }

    async fn list_orgs(
        &self,
        token: &str,
        filter: &OrgFilter,
        page: Page,
    ) -> AuthResult<Paged<Org>> {
        let caller = self.caller(token).await?;
        let visible_to = (!caller.is_admin()).then(|| caller.id());
        self.store.list_orgs(filter, visible_to, page).await
    }

    #[instrument(skip(self, token))]
    async fn assign_org_groups(
        &self,
        token: &str,
        org_id: Uuid,
        group_ids: &[Uuid],
    ) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Group, Action::Create)
            .await?;
        self.store.assign_groups(org_id, group_ids).await
    }

    #[instrument(skip(self, token))]
    async fn unassign_org_groups(
        &self,
        token: &str,
        org_id: Uuid,
        group_ids: &[Uuid],
    ) -> AuthResult<()> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Group, Action::Delete)
            .await?;
        self.store.unassign_groups(org_id, group_ids).await
    }

    async fn list_org_groups(
        &self,
        token: &str,
        org_id: Uuid,
        page: Page,
    ) -> AuthResult<Paged<OrgGroup>> {
        let caller = self.caller(token).await?;
        self.load_org(&caller, org_id, ResourceType::Group, Action::List)
            .await?;
        self.store.list_groups(org_id, page).await
    }
}
