//! # Tenancy Store
//!
//! Persistence ports for the tenancy core and the backends implementing them.
//!
//! ## Overview
//!
//! - **Repositories**: one async trait per concern ([`KeyRepository`],
//!   [`RoleRepository`], [`OrgRepository`], [`MembershipRepository`],
//!   [`InviteRepository`]), bundled as [`Store`]
//! - **Atomicity**: multi-row writes apply fully or not at all
//! - **Errors**: backends report failures as [`tenancy_auth::AuthError`]
//!
//! ## Features
//!
//! - `memory` (default): in-memory store for tests and single-process apps
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tenancy_store::{MemoryStore, Store};
//!
//! let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
//! ```

pub mod repository;

#[cfg(feature = "memory")]
pub mod memory;

// Re-export main types
pub use repository::{
    InviteRepository, KeyRepository, MembershipRepository, OrgInviteQuery, OrgInviteScope,
    OrgRepository, PlatformInviteScope, PlatformInviteTarget, RoleRepository, Store,
};

#[cfg(feature = "memory")]
pub use memory::MemoryStore;
