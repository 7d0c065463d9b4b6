//! Role definitions
//!
//! Two independent role ladders exist: the platform role assigned once per
//! user, and the membership role a member holds inside one organization.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::permissions::PermissionSet;
use crate::resources::ResourceType;

/// Platform-scope role, one per user.
///
/// Platform admins bypass every org-scoped check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlatformRole {
    /// Regular account.
    #[default]
    User,
    /// Elevated account with access to every tenant.
    Admin,
}

impl PlatformRole {
    /// Parse role from string representation (case-insensitive).
    ///
    /// ```
    /// use tenancy_rbac::PlatformRole;
    ///
    /// assert_eq!(PlatformRole::parse("ADMIN"), Some(PlatformRole::Admin));
    /// assert_eq!(PlatformRole::parse("root"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Check if this role has platform-wide privileges.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for PlatformRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a member holds within an organization.
///
/// Roles are hierarchical: Viewer < Editor < Admin. Each role's permission
/// set is a superset of the role below it.
///
/// # Examples
///
/// ```
/// use tenancy_rbac::{Action, MembershipRole, ResourceType};
///
/// let editor = MembershipRole::Editor;
/// assert!(editor.permissions().allows(ResourceType::Organization, Action::Update));
/// assert!(!editor.permissions().allows(ResourceType::OrgInvite, Action::Create));
/// assert!(MembershipRole::Admin > MembershipRole::Editor);
/// ```
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    /// Read-only access to the organization.
    #[default]
    Viewer = 0,

    /// Can update organization details.
    Editor = 1,

    /// Can manage members, groups and invites.
    Admin = 2,
}

impl MembershipRole {
    /// Parse role from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "editor" => Some(Self::Editor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }

    /// Get human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Viewer => "Viewer",
            Self::Editor => "Editor",
            Self::Admin => "Administrator",
        }
    }

    /// Check if this role can manage members, groups and invites.
    pub fn is_admin(&self) -> bool {
        *self >= Self::Admin
    }

    /// Build the permission set granted by this role.
    ///
    /// - **Viewer**: read/list the org, its memberships and groups
    /// - **Editor**: viewer + update the org
    /// - **Admin**: editor + manage memberships, groups and org invites
    pub fn permissions(&self) -> PermissionSet {
        let mut set = PermissionSet::new()
            .with(ResourceType::Organization, Action::Read)
            .with(ResourceType::Membership, Action::Read)
            .with(ResourceType::Group, Action::Read);

        if *self >= Self::Editor {
            set = set.with(ResourceType::Organization, Action::Update);
        }

        if *self >= Self::Admin {
            set = set
                .with(ResourceType::Membership, Action::Manage)
                .with(ResourceType::Group, Action::Manage)
                .with(ResourceType::OrgInvite, Action::Manage);
        }

        set
    }

    /// Get all membership roles, lowest first.
    pub fn all() -> [Self; 3] {
        [Self::Viewer, Self::Editor, Self::Admin]
    }
}

impl std::fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
