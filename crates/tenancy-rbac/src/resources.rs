//! # Resource Types
//!
//! Defines the resource kinds the tenancy core authorizes access to.

use serde::{Deserialize, Serialize};

/// Resource types that can have permissions assigned.
///
/// Org-scoped resources (organization, membership, group, org invite) are
/// checked against the caller's membership role in that org. The remaining
/// resources are platform-scoped and only reachable through ownership or the
/// platform `admin` role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Access keys (login, recovery, API).
    Key,
    /// Organizations.
    Organization,
    /// Organization memberships.
    Membership,
    /// Group associations of an organization.
    Group,
    /// Organization invites.
    OrgInvite,
    /// Platform invites (account bootstrap).
    PlatformInvite,
    /// Full or scoped snapshots for disaster recovery.
    Backup,
}

impl ResourceType {
    /// Get the string representation of the resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Key => "key",
            ResourceType::Organization => "organization",
            ResourceType::Membership => "membership",
            ResourceType::Group => "group",
            ResourceType::OrgInvite => "org_invite",
            ResourceType::PlatformInvite => "platform_invite",
            ResourceType::Backup => "backup",
        }
    }

    /// Parse resource type from string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use tenancy_rbac::resources::ResourceType;
    ///
    /// assert_eq!(ResourceType::parse("org"), Some(ResourceType::Organization));
    /// assert_eq!(ResourceType::parse("org-invite"), Some(ResourceType::OrgInvite));
    /// assert_eq!(ResourceType::parse("nope"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "key" | "api_key" => Some(ResourceType::Key),
            "organization" | "org" => Some(ResourceType::Organization),
            "membership" | "member" => Some(ResourceType::Membership),
            "group" => Some(ResourceType::Group),
            "org_invite" => Some(ResourceType::OrgInvite),
            "platform_invite" => Some(ResourceType::PlatformInvite),
            "backup" => Some(ResourceType::Backup),
            _ => None,
        }
    }

    /// Get all resource types.
    pub fn all() -> Vec<Self> {
        vec![
            ResourceType::Key,
            ResourceType::Organization,
            ResourceType::Membership,
            ResourceType::Group,
            ResourceType::OrgInvite,
            ResourceType::PlatformInvite,
            ResourceType::Backup,
        ]
    }

    /// Whether access to this resource is decided inside an org scope.
    pub fn is_org_scoped(&self) -> bool {
        matches!(
            self,
            ResourceType::Organization
                | ResourceType::Membership
                | ResourceType::Group
                | ResourceType::OrgInvite
        )
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
