//! # Policy
//!
//! The single authorization decision point. [`authorize`] is a pure function
//! over the facts a caller gathered beforehand: who is asking, their platform
//! role, who owns the object, and which membership role (if any) the subject
//! holds in the org the object lives in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actions::Action;
use crate::resources::ResourceType;
use crate::roles::{MembershipRole, PlatformRole};

/// Org context for an org-scoped decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgScope {
    /// Organization the object belongs to.
    pub org_id: Uuid,
    /// Role the subject holds in that org, `None` when not a member.
    pub member_role: Option<MembershipRole>,
}

impl OrgScope {
    /// Create a new org scope.
    pub fn new(org_id: Uuid, member_role: Option<MembershipRole>) -> Self {
        Self {
            org_id,
            member_role,
        }
    }
}

/// Everything [`authorize`] needs to reach a decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessRequest {
    /// Authenticated principal performing the action.
    pub subject: Uuid,
    /// Platform role of the subject.
    pub platform_role: PlatformRole,
    /// Kind of object being accessed.
    pub resource: ResourceType,
    /// Requested action.
    pub action: Action,
    /// Owner of the object, when ownership applies.
    pub owner: Option<Uuid>,
    /// Org context, for org-scoped resources.
    pub scope: Option<OrgScope>,
}

impl AccessRequest {
    /// Create a request without ownership or org context.
    pub fn new(
        subject: Uuid,
        platform_role: PlatformRole,
        resource: ResourceType,
        action: Action,
    ) -> Self {
        Self {
            subject,
            platform_role,
            resource,
            action,
            owner: None,
            scope: None,
        }
    }

    /// Attach the object owner.
    pub fn with_owner(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Attach the org context.
    pub fn with_scope(mut self, scope: OrgScope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Outcome of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Access granted.
    Allow,
    /// Access denied, with a short human-readable reason.
    Deny(String),
}

impl Decision {
    /// Check if the decision allows access.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convert into a `Result`, keeping the denial reason as the error.
    pub fn into_result(self) -> Result<(), String> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Decide whether `req` is allowed.
///
/// Rules are evaluated in order:
/// 1. platform admins are always allowed
/// 2. the owner of the object is always allowed
/// 3. for org-scoped resources, the subject's membership role must grant
///    `(resource, action)`
///
/// Anything else is denied.
pub fn authorize(req: &AccessRequest) -> Decision {
    if req.platform_role.is_admin() {
        return Decision::Allow;
    }

    if req.owner == Some(req.subject) {
        return Decision::Allow;
    }

    if !req.resource.is_org_scoped() {
        return Decision::Deny(format!(
            "{} on {} requires ownership or platform admin",
            req.action, req.resource
        ));
    }

    let Some(scope) = req.scope else {
        return Decision::Deny(format!("{} on {} requires an org scope", req.action, req.resource));
    };

    match scope.member_role {
        Some(role) if role.permissions().allows(req.resource, req.action) => Decision::Allow,
        Some(role) => Decision::Deny(format!(
            "role {} cannot {} {} in org {}",
            role, req.action, req.resource, scope.org_id
        )),
        None => Decision::Deny(format!("not a member of org {}", scope.org_id)),
    }
}
