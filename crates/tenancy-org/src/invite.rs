//! # Invites
//!
//! Two invite kinds share one lifecycle:
//!
//! - **Platform invites** target an email address before an account exists.
//! - **Org invites** grant membership in an organization. An org invite
//!   without an invitee is *dormant*: it is tied to a platform invite through
//!   a [`DormantOrgInviteLink`] and gets its invitee at activation.
//!
//! ## State machine
//!
//! ```text
//! pending ──accept──→ accepted
//!    │ ───decline──→ declined
//!    └───timeout───→ expired
//! ```
//!
//! Terminal states never change. Expiry is lazy: [`InviteState::project`]
//! computes the effective state of a row at read time, and stores persist the
//! same projection in scoped sweeps before any state-dependent operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenancy_rbac::MembershipRole;
use uuid::Uuid;

use crate::group::GroupGrant;
use crate::page::Page;

/// Lifecycle state shared by org and platform invites.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InviteState {
    /// Awaiting a response.
    #[default]
    Pending,
    /// Accepted by the invitee.
    Accepted,
    /// Declined by the invitee.
    Declined,
    /// Timed out before a response.
    Expired,
}

impl InviteState {
    /// Effective state of an invite at `now`.
    ///
    /// A pending invite whose expiry has been reached is expired; every other
    /// state is returned unchanged.
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use tenancy_org::InviteState;
    ///
    /// let now = Utc::now();
    /// assert_eq!(InviteState::project(InviteState::Pending, now - Duration::seconds(1), now), InviteState::Expired);
    /// assert_eq!(InviteState::project(InviteState::Pending, now + Duration::hours(1), now), InviteState::Pending);
    /// assert_eq!(InviteState::project(InviteState::Declined, now - Duration::hours(1), now), InviteState::Declined);
    /// ```
    pub fn project(state: InviteState, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> InviteState {
        if state == InviteState::Pending && expires_at <= now {
            InviteState::Expired
        } else {
            state
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InviteState::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InviteState::Pending => "pending",
            InviteState::Accepted => "accepted",
            InviteState::Declined => "declined",
            InviteState::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(InviteState::Pending),
            "accepted" => Some(InviteState::Accepted),
            "declined" => Some(InviteState::Declined),
            "expired" => Some(InviteState::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for InviteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invitation to join an organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgInvite {
    /// Unique invite ID
    pub id: Uuid,

    /// Invited user, `None` while the invite is dormant
    pub invitee_id: Option<Uuid>,

    /// User who sent the invite
    pub inviter_id: Uuid,

    /// Target organization
    pub org_id: Uuid,

    /// Role granted on acceptance
    pub invitee_role: MembershipRole,

    /// Group roles granted together with the membership
    #[serde(default)]
    pub groups: Vec<GroupGrant>,

    /// When the invite was created
    pub created_at: DateTime<Utc>,

    /// When the invite last changed state or was activated
    pub updated_at: DateTime<Utc>,

    /// When a pending invite lapses
    pub expires_at: DateTime<Utc>,

    /// Stored lifecycle state
    pub state: InviteState,
}

impl OrgInvite {
    /// Create a pending invite.
    pub fn new(
        inviter_id: Uuid,
        invitee_id: Option<Uuid>,
        org_id: Uuid,
        invitee_role: MembershipRole,
        groups: Vec<GroupGrant>,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            invitee_id,
            inviter_id,
            org_id,
            invitee_role,
            groups,
            created_at: now,
            updated_at: now,
            expires_at,
            state: InviteState::Pending,
        }
    }

    /// Whether the invite is still waiting for its invitee.
    pub fn is_dormant(&self) -> bool {
        self.invitee_id.is_none()
    }

    /// Effective state at `now`.
    ///
    /// Dormant invites keep their stored state; their lifetime is bound to
    /// the platform invite they are linked to.
    pub fn effective_state(&self, now: DateTime<Utc>) -> InviteState {
        if self.is_dormant() {
            self.state
        } else {
            InviteState::project(self.state, self.expires_at, now)
        }
    }

    /// Copy with the state replaced by its projection at `now`.
    pub fn projected(mut self, now: DateTime<Utc>) -> Self {
        self.state = self.effective_state(now);
        self
    }

    /// Whether the invite occupies the "one pending per (invitee, org)" slot.
    pub fn is_live_pending(&self, now: DateTime<Utc>) -> bool {
        self.effective_state(now) == InviteState::Pending
    }
}

/// Invitation to join the platform, addressed to an email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformInvite {
    /// Unique invite ID
    pub id: Uuid,

    /// Lower-cased email of the invitee
    pub invitee_email: String,

    /// When the invite was created
    pub created_at: DateTime<Utc>,

    /// When the invite last changed state
    pub updated_at: DateTime<Utc>,

    /// When a pending invite lapses
    pub expires_at: DateTime<Utc>,

    /// Stored lifecycle state
    pub state: InviteState,
}

impl PlatformInvite {
    /// Create a pending platform invite. `email` must already be normalized.
    pub fn new(email: String, now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            invitee_email: email,
            created_at: now,
            updated_at: now,
            expires_at,
            state: InviteState::Pending,
        }
    }

    pub fn effective_state(&self, now: DateTime<Utc>) -> InviteState {
        InviteState::project(self.state, self.expires_at, now)
    }

    pub fn projected(mut self, now: DateTime<Utc>) -> Self {
        self.state = self.effective_state(now);
        self
    }
}

/// Single-use link between a dormant org invite and the platform invite that
/// will resolve its invitee. Consumed at activation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DormantOrgInviteLink {
    /// Dormant org invite
    pub org_invite_id: Uuid,
    /// Platform invite resolving the invitee
    pub platform_invite_id: Uuid,
}

impl DormantOrgInviteLink {
    pub fn new(org_invite_id: Uuid, platform_invite_id: Uuid) -> Self {
        Self {
            org_invite_id,
            platform_invite_id,
        }
    }
}

/// Who an org invite is addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Invitee {
    /// An existing user.
    Member(Uuid),
    /// An email address, possibly without an account yet.
    Email(String),
}

/// Request to create an org invite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewOrgInvite {
    /// Target of the invite
    pub invitee: Invitee,
    /// Role granted on acceptance
    pub role: MembershipRole,
    /// Target organization
    pub org_id: Uuid,
    /// Group roles granted on acceptance
    #[serde(default)]
    pub groups: Vec<GroupGrant>,
}

impl NewOrgInvite {
    pub fn new(invitee: Invitee, role: MembershipRole, org_id: Uuid) -> Self {
        Self {
            invitee,
            role,
            org_id,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, grant: GroupGrant) -> Self {
        self.groups.push(grant);
        self
    }
}

/// Which side of an invite a user is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InviteDirection {
    /// Invites addressed to the user.
    #[default]
    Received,
    /// Invites the user sent.
    Sent,
    /// Both.
    Any,
}

impl InviteDirection {
    /// Whether `invite` involves `user_id` on this side.
    pub fn includes(&self, invite: &OrgInvite, user_id: Uuid) -> bool {
        let received = invite.invitee_id == Some(user_id);
        let sent = invite.inviter_id == user_id;
        match self {
            InviteDirection::Received => received,
            InviteDirection::Sent => sent,
            InviteDirection::Any => received || sent,
        }
    }
}

/// Filter for org invite listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InviteFilter {
    /// Side of the invite, for per-user listings
    #[serde(default)]
    pub direction: InviteDirection,
    /// Only invites in this (effective) state
    pub state: Option<InviteState>,
    /// Requested page
    #[serde(default)]
    pub page: Page,
}

impl InviteFilter {
    pub fn with_state(mut self, state: InviteState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_direction(mut self, direction: InviteDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn accepts_state(&self, state: InviteState) -> bool {
        self.state.map_or(true, |wanted| wanted == state)
    }
}

/// Filter for platform invite listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformInviteFilter {
    /// Only invites for this email (normalized before comparison)
    pub email: Option<String>,
    /// Only invites in this (effective) state
    pub state: Option<InviteState>,
    /// Requested page
    #[serde(default)]
    pub page: Page,
}

impl PlatformInviteFilter {
    pub fn matches(&self, invite: &PlatformInvite) -> bool {
        let email_ok = self
            .email
            .as_deref()
            .map_or(true, |email| invite.invitee_email == email.trim().to_lowercase());
        let state_ok = self.state.map_or(true, |state| invite.state == state);
        email_ok && state_ok
    }
}

/// Normalize an email address: trimmed and lower-cased.
///
/// Returns `None` when the address is not of the form `local@domain.tld`.
///
/// ```
/// use tenancy_org::normalize_email;
///
/// assert_eq!(normalize_email(" Bob@X.com "), Some("bob@x.com".to_string()));
/// assert_eq!(normalize_email("bob"), None);
/// assert_eq!(normalize_email("bob@localhost"), None);
/// ```
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return None;
    }

    Some(email)
}
