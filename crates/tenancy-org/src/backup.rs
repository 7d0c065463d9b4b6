//! Disaster-recovery snapshots.

use serde::{Deserialize, Serialize};

use crate::group::{GroupMembership, OrgGroup};
use crate::membership::OrgMembership;
use crate::organization::Org;

/// Full snapshot of organizations and everything that hangs off them,
/// apart from invites.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Backup {
    /// All organizations
    pub orgs: Vec<Org>,
    /// All org memberships
    pub memberships: Vec<OrgMembership>,
    /// All org/group associations
    #[serde(default)]
    pub org_groups: Vec<OrgGroup>,
    /// All group memberships
    #[serde(default)]
    pub group_memberships: Vec<GroupMembership>,
}

impl Backup {
    /// Whether the snapshot holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.orgs.is_empty()
            && self.memberships.is_empty()
            && self.org_groups.is_empty()
            && self.group_memberships.is_empty()
    }
}
