//! # Permissions
//!
//! A permission pairs a resource kind with an action. Membership roles map
//! to a [`PermissionSet`]; which org the set applies to is carried by the
//! request's [`OrgScope`](crate::policy::OrgScope), never by the permission.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::actions::Action;
use crate::resources::ResourceType;

/// `(resource, action)` pair, rendered as `resource:action`.
///
/// ```
/// use tenancy_rbac::{Action, Permission, ResourceType};
///
/// let perm = Permission::new(ResourceType::OrgInvite, Action::Delete);
/// assert_eq!(perm.to_string(), "org_invite:delete");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    pub resource: ResourceType,
    pub action: Action,
}

impl Permission {
    pub fn new(resource: ResourceType, action: Action) -> Self {
        Self { resource, action }
    }

    /// Whether holding `self` is enough to perform `other`.
    pub fn grants(&self, other: &Permission) -> bool {
        self.resource == other.resource
            && (self.action == other.action || self.action.implies(other.action))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Permissions granted by a role.
///
/// ```
/// use tenancy_rbac::{Action, PermissionSet, ResourceType};
///
/// let set = PermissionSet::new().with(ResourceType::Organization, Action::Update);
///
/// // Update implies Read
/// assert!(set.allows(ResourceType::Organization, Action::Read));
/// assert!(!set.allows(ResourceType::Organization, Action::Delete));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: BTreeSet<Permission>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `(resource, action)` grant.
    pub fn with(mut self, resource: ResourceType, action: Action) -> Self {
        self.permissions.insert(Permission::new(resource, action));
        self
    }

    /// Whether some grant in the set covers `(resource, action)`, directly or
    /// through action implication.
    pub fn allows(&self, resource: ResourceType, action: Action) -> bool {
        let wanted = Permission::new(resource, action);
        self.permissions.iter().any(|p| p.grants(&wanted))
    }

    /// Whether every grant of `other` is covered by this set.
    pub fn covers(&self, other: &PermissionSet) -> bool {
        other
            .permissions
            .iter()
            .all(|p| self.allows(p.resource, p.action))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}
