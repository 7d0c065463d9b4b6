use async_trait::async_trait;
use tenancy_auth::AuthResult;
use tenancy_rbac::PlatformRole;
use tenancy_store::RoleRepository;
use tracing::info;
use uuid::Uuid;

use super::AuthCore;
use crate::service::RoleService;

#[async_trait]
impl RoleService for AuthCore {
    async fn assign_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()> {
        self.store.assign_role(user_id, role).await?;
        info!(user_id = %user_id, role = %role, "Assigned platform role");
        Ok(())
    }

    async fn retrieve_role(&self, user_id: Uuid) -> AuthResult<Option<PlatformRole>> {
        self.store.retrieve_role(user_id).await
    }

    async fn update_role(&self, user_id: Uuid, role: PlatformRole) -> AuthResult<()> {
        self.store.update_role(user_id, role).await?;
        info!(user_id = %user_id, role = %role, "Updated platform role");
        Ok(())
    }

    async fn remove_role(&self, user_id: Uuid) -> AuthResult<()> {
        self.store.remove_role(user_id).await
    }
}
