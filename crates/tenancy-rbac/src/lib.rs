//! # Tenancy RBAC (Role-Based Access Control)
//!
//! This crate holds the authorization vocabulary of the tenancy core and the
//! single, side-effect free decision function every facade operation calls
//! before it touches a store.
//!
//! ## Overview
//!
//! - **Roles**: platform roles (`admin`, `user`) and org membership roles
//!   (`viewer`, `editor`, `admin`)
//! - **Resources**: keys, organizations, memberships, groups, invites
//! - **Actions**: operations that can be performed on resources
//! - **Permissions**: Resource + Action combinations, grouped into sets
//! - **Policy**: [`authorize`] over (subject role, object ownership, action)
//!
//! ## Architecture
//!
//! ```text
//! AccessRequest { subject, platform_role, resource, action, owner, scope }
//!        │
//!        ├─ platform admin            → Allow
//!        ├─ owner == subject          → Allow
//!        ├─ scope.member_role grants  → Allow
//!        └─ otherwise                 → Deny
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tenancy_rbac::{authorize, AccessRequest, Action, MembershipRole, OrgScope, PlatformRole, ResourceType};
//! use uuid::Uuid;
//!
//! let subject = Uuid::now_v7();
//! let org_id = Uuid::now_v7();
//!
//! let req = AccessRequest::new(subject, PlatformRole::User, ResourceType::Membership, Action::Create)
//!     .with_scope(OrgScope::new(org_id, Some(MembershipRole::Admin)));
//! assert!(authorize(&req).is_allowed());
//! ```

pub mod actions;
pub mod permissions;
pub mod policy;
pub mod resources;
pub mod roles;

// Re-export main types for convenience
pub use actions::Action;
pub use permissions::{Permission, PermissionSet};
pub use policy::{authorize, AccessRequest, Decision, OrgScope};
pub use resources::ResourceType;
pub use roles::{MembershipRole, PlatformRole};
