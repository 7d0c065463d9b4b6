//! Membership domain models
//!
//! A membership binds a member to an organization with a single role. The
//! pair `(org_id, member_id)` is unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenancy_rbac::MembershipRole;
use uuid::Uuid;

/// Organization membership linking a user to an organization.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use uuid::Uuid;
/// use tenancy_org::OrgMembership;
/// use tenancy_rbac::MembershipRole;
///
/// let org_id = Uuid::now_v7();
/// let member_id = Uuid::now_v7();
/// let membership = OrgMembership::new(org_id, member_id, MembershipRole::Editor, Utc::now());
/// assert_eq!(membership.key(), (org_id, member_id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgMembership {
    /// Organization ID
    pub org_id: Uuid,

    /// Member (user) ID
    pub member_id: Uuid,

    /// Role within the organization
    pub role: MembershipRole,

    /// When the membership was granted
    pub created_at: DateTime<Utc>,

    /// When the role was last changed
    pub updated_at: DateTime<Utc>,
}

impl OrgMembership {
    /// Creates a new membership.
    pub fn new(org_id: Uuid, member_id: Uuid, role: MembershipRole, now: DateTime<Utc>) -> Self {
        Self {
            org_id,
            member_id,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Composite key of the membership.
    pub fn key(&self) -> (Uuid, Uuid) {
        (self.org_id, self.member_id)
    }
}

/// A `(member, role)` pair used by the bulk membership operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberRole {
    /// Member (user) ID
    pub member_id: Uuid,

    /// Role to grant or set
    pub role: MembershipRole,
}

impl MemberRole {
    pub fn new(member_id: Uuid, role: MembershipRole) -> Self {
        Self { member_id, role }
    }

    /// Materialize this pair as a membership of `org_id`.
    pub fn into_membership(self, org_id: Uuid, now: DateTime<Utc>) -> OrgMembership {
        OrgMembership::new(org_id, self.member_id, self.role, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_into_membership() {
        let org_id = Uuid::now_v7();
        let member_id = Uuid::now_v7();
        let now = Utc::now();

        let membership = MemberRole::new(member_id, MembershipRole::Admin).into_membership(org_id, now);
        assert_eq!(membership.org_id, org_id);
        assert_eq!(membership.member_id, member_id);
        assert_eq!(membership.role, MembershipRole::Admin);
        assert_eq!(membership.created_at, now);
    }

    #[test]
    fn test_membership_serialization() {
        let membership =
            OrgMembership::new(Uuid::now_v7(), Uuid::now_v7(), MembershipRole::Viewer, Utc::now());
        let json = serde_json::to_value(&membership).unwrap();
        assert_eq!(json["role"], "viewer");

        let back: OrgMembership = serde_json::from_value(json).unwrap();
        assert_eq!(back, membership);
    }
}
