//! # Tenancy Organization Model
//!
//! Domain entities of the tenancy core: organizations, memberships, group
//! associations and the two invite kinds, plus the filters and pages used to
//! list them.
//!
//! ## Architecture
//!
//! ```text
//! Org ─┬─ OrgMembership (org, member) → role
//!      ├─ OrgGroup (org, group) ── GroupMembership (group, member) → role
//!      └─ OrgInvite ─┬─ invitee_id: Some(user)   addressed
//!                    └─ invitee_id: None          dormant
//!                          └─ DormantOrgInviteLink ─→ PlatformInvite (email)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use tenancy_org::{InviteState, NewOrg, Org, OrgInvite};
//! use tenancy_rbac::MembershipRole;
//! use uuid::Uuid;
//!
//! let now = Utc::now();
//! let owner = Uuid::now_v7();
//! let org = Org::new(NewOrg::new("Acme"), owner, now).unwrap();
//!
//! let invite = OrgInvite::new(
//!     owner,
//!     Some(Uuid::now_v7()),
//!     org.id,
//!     MembershipRole::Viewer,
//!     Vec::new(),
//!     now,
//!     now + Duration::days(7),
//! );
//! assert_eq!(invite.effective_state(now + Duration::days(8)), InviteState::Expired);
//! ```

pub mod backup;
pub mod group;
pub mod invite;
pub mod membership;
pub mod organization;
pub mod page;

// Re-export main types for convenience
pub use backup::Backup;
pub use group::{GroupGrant, GroupMembership, OrgGroup};
pub use invite::{
    normalize_email, DormantOrgInviteLink, InviteDirection, InviteFilter, InviteState, Invitee,
    NewOrgInvite, OrgInvite, PlatformInvite, PlatformInviteFilter,
};
pub use membership::{MemberRole, OrgMembership};
pub use organization::{object_contains, Metadata, NewOrg, Org, OrgFilter, OrgUpdate};
pub use page::{Page, Paged};
