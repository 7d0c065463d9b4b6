//! Group associations
//!
//! Groups themselves live in an external service. The tenancy core only
//! records which groups belong to an organization and the role a member
//! holds in a group, both of which can be granted by accepting an invite.

use serde::{Deserialize, Serialize};
use tenancy_rbac::MembershipRole;
use uuid::Uuid;

/// Association of a group with an organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrgGroup {
    /// Organization ID
    pub org_id: Uuid,
    /// Group ID
    pub group_id: Uuid,
}

impl OrgGroup {
    pub fn new(org_id: Uuid, group_id: Uuid) -> Self {
        Self { org_id, group_id }
    }
}

/// Role a member holds inside a group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMembership {
    /// Group ID
    pub group_id: Uuid,
    /// Member (user) ID
    pub member_id: Uuid,
    /// Role within the group
    pub role: MembershipRole,
}

impl GroupMembership {
    pub fn new(group_id: Uuid, member_id: Uuid, role: MembershipRole) -> Self {
        Self {
            group_id,
            member_id,
            role,
        }
    }

    pub fn key(&self) -> (Uuid, Uuid) {
        (self.group_id, self.member_id)
    }
}

/// A group-role pair attached to an org invite, applied on acceptance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupGrant {
    /// Group the invitee joins
    pub group_id: Uuid,
    /// Role the invitee receives in the group
    pub member_role: MembershipRole,
}

impl GroupGrant {
    pub fn new(group_id: Uuid, member_role: MembershipRole) -> Self {
        Self {
            group_id,
            member_role,
        }
    }

    /// Materialize the grant for a member.
    pub fn for_member(&self, member_id: Uuid) -> GroupMembership {
        GroupMembership::new(self.group_id, member_id, self.member_role)
    }
}
