//! Invite notifications.
//!
//! Delivery is someone else's job: the service hands every created or
//! activated invite to an [`InviteNotifier`] together with the redirect path
//! the invitee should land on. A failed notification never rolls back the
//! invite; it is logged and the call succeeds.

use async_trait::async_trait;
use tenancy_org::{OrgInvite, PlatformInvite};
use thiserror::Error;

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Receives invite lifecycle events worth telling a human about.
#[async_trait]
pub trait InviteNotifier: Send + Sync {
    /// An org invite was created for an existing user.
    async fn org_invite_created(
        &self,
        invite: &OrgInvite,
        redirect_path: &str,
    ) -> Result<(), NotifyError>;

    /// A platform invite was created, or reused for another dormant invite.
    async fn platform_invite_created(
        &self,
        invite: &PlatformInvite,
        redirect_path: &str,
    ) -> Result<(), NotifyError>;

    /// Dormant org invites were activated for a newly registered user.
    async fn org_invites_activated(
        &self,
        invites: &[OrgInvite],
        redirect_path: &str,
    ) -> Result<(), NotifyError>;
}

/// Notifier for local development.
/// Logs every notification using tracing::info!.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl InviteNotifier for TracingNotifier {
    async fn org_invite_created(
        &self,
        invite: &OrgInvite,
        redirect_path: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            invite_id = %invite.id,
            org_id = %invite.org_id,
            role = %invite.invitee_role,
            redirect_path,
            "Org invite notification (console)"
        );
        Ok(())
    }

    async fn platform_invite_created(
        &self,
        invite: &PlatformInvite,
        redirect_path: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            invite_id = %invite.id,
            email = %invite.invitee_email,
            redirect_path,
            "Platform invite notification (console)"
        );
        Ok(())
    }

    async fn org_invites_activated(
        &self,
        invites: &[OrgInvite],
        redirect_path: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            count = invites.len(),
            redirect_path,
            "Activated org invites notification (console)"
        );
        Ok(())
    }
}
