#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tenancy_auth::{generate_secret, AuthConfig, JwtTokenizer, NewKey};
use tenancy_org::{NewOrg, Org, OrgInvite, PlatformInvite};
use tenancy_rbac::PlatformRole;
use tenancy_service::{
    AuthCore, IdentityService, InviteNotifier, ManualClock, MemoryDirectory, NotifyError,
    OrgService, RoleService,
};
use tenancy_store::MemoryStore;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Notification {
    OrgInvite(OrgInvite),
    PlatformInvite(PlatformInvite),
    Activated(Vec<OrgInvite>),
}

/// Notifier keeping every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: bool,
}

impl RecordingNotifier {
    /// Notifier whose deliveries always fail.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn last_platform_invite(&self) -> Option<PlatformInvite> {
        self.sent.lock().await.iter().rev().find_map(|n| match n {
            Notification::PlatformInvite(invite) => Some(invite.clone()),
            _ => None,
        })
    }

    async fn record(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Delivery("mailbox unavailable".to_string()));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

#[async_trait]
impl InviteNotifier for RecordingNotifier {
    async fn org_invite_created(
        &self,
        invite: &OrgInvite,
        _redirect_path: &str,
    ) -> Result<(), NotifyError> {
        self.record(Notification::OrgInvite(invite.clone())).await
    }

    async fn platform_invite_created(
        &self,
        invite: &PlatformInvite,
        _redirect_path: &str,
    ) -> Result<(), NotifyError> {
        self.record(Notification::PlatformInvite(invite.clone())).await
    }

    async fn org_invites_activated(
        &self,
        invites: &[OrgInvite],
        _redirect_path: &str,
    ) -> Result<(), NotifyError> {
        self.record(Notification::Activated(invites.to_vec())).await
    }
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        login_key_ttl: Duration::days(365),
        ..AuthConfig::default()
    }
    .with_secret(generate_secret())
}

/// A core over the memory store with a manual clock.
pub struct Harness {
    pub core: AuthCore,
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub directory: Arc<MemoryDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let config = test_config();
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let directory = Arc::new(MemoryDirectory::new());
        let notifier = Arc::new(notifier);
        let tokenizer = JwtTokenizer::from_config(&config).unwrap();

        let core = AuthCore::new(
            Arc::new(store.clone()),
            Arc::new(tokenizer),
            clock.clone(),
            directory.clone(),
            notifier.clone(),
            config,
        );

        Self {
            core,
            store,
            clock,
            directory,
            notifier,
        }
    }

    /// Login key secret for `user_id`.
    pub async fn login(&self, user_id: Uuid) -> String {
        self.core.issue("", NewKey::login(user_id)).await.unwrap().1
    }

    /// A fresh user with a login key.
    pub async fn user(&self) -> (Uuid, String) {
        let user_id = Uuid::now_v7();
        (user_id, self.login(user_id).await)
    }

    /// A fresh platform admin with a login key.
    pub async fn admin(&self) -> (Uuid, String) {
        let user_id = Uuid::now_v7();
        self.core
            .assign_role(user_id, PlatformRole::Admin)
            .await
            .unwrap();
        (user_id, self.login(user_id).await)
    }

    pub async fn org(&self, token: &str, name: &str) -> Org {
        self.core.create_org(token, NewOrg::new(name)).await.unwrap()
    }
}
