//! # Tenancy Service
//!
//! The authorization facade of the tenancy core: key issuance and
//! identification, authorization decisions, organizations, memberships and
//! the two-stage invite workflow.
//!
//! ## Overview
//!
//! - **Facade**: [`AuthService`], implemented by [`AuthCore`]
//! - **Invite engine**: lazy expiry, dormant invites and their activation
//! - **Ports**: [`Clock`], [`UserDirectory`] and [`InviteNotifier`], injected
//!   together with a [`tenancy_store::Store`] and a
//!   [`tenancy_auth::Tokenizer`]
//! - **Middleware**: [`Instrumented`] reports every call to
//!   [`CallObserver`]s
//!
//! ## Invite workflow
//!
//! ```text
//! create_org_invite(email) ──► dormant OrgInvite + PlatformInvite + link
//!                                         │
//! validate_platform_invite ──► PlatformInvite accepted
//!                                         │
//! activate_org_invite(user) ──► invitee set, expiry re-armed, link consumed
//!                                         │
//! respond_org_invite(accept) ──► OrgMembership (+ group roles)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenancy_auth::{AuthConfig, NewKey};
//! use tenancy_org::NewOrg;
//! use tenancy_service::{AuthCore, IdentityService, OrgService};
//! use uuid::Uuid;
//!
//! async fn example() {
//!     let core = AuthCore::in_memory(AuthConfig::from_env()).unwrap();
//!
//!     let user = Uuid::now_v7();
//!     let (_, token) = core.issue("", NewKey::login(user)).await.unwrap();
//!     let org = core.create_org(&token, NewOrg::new("Acme")).await.unwrap();
//!     assert_eq!(org.owner_id, user);
//! }
//! ```

pub mod clock;
pub mod directory;
mod engine;
pub mod middleware;
pub mod notify;
pub mod service;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{MemoryDirectory, UserDirectory};
pub use engine::AuthCore;
pub use middleware::{CallObserver, CallRecord, Instrumented, TracingObserver};
pub use notify::{InviteNotifier, NotifyError, TracingNotifier};
pub use service::{
    AuthService, IdentityService, InviteService, MembershipService, OrgService, RoleService,
};
