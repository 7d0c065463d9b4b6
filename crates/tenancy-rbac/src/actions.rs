//! # Actions
//!
//! Operations a caller can request on a tenancy resource.

use serde::{Deserialize, Serialize};

/// Requested operation.
///
/// Actions form a small lattice: `Manage` implies everything, the mutating
/// actions imply `Read` and `List`, and `Read` implies `List`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    List,
    Create,
    Update,
    Delete,
    /// Administer the resource. Implies every other action.
    Manage,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }

    /// Parse an action name, case-insensitively. Common verbs of the invite
    /// and key workflows are accepted as aliases.
    ///
    /// ```
    /// use tenancy_rbac::Action;
    ///
    /// assert_eq!(Action::parse("Read"), Some(Action::Read));
    /// assert_eq!(Action::parse("invite"), Some(Action::Create));
    /// assert_eq!(Action::parse("revoke"), Some(Action::Delete));
    /// assert_eq!(Action::parse("approve"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" | "view" => Some(Action::Read),
            "list" => Some(Action::List),
            "create" | "issue" | "invite" => Some(Action::Create),
            "update" | "edit" => Some(Action::Update),
            "delete" | "remove" | "revoke" => Some(Action::Delete),
            "manage" => Some(Action::Manage),
            _ => None,
        }
    }

    pub fn all() -> [Self; 6] {
        [
            Action::Read,
            Action::List,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ]
    }

    /// Whether holding `self` also permits `other`.
    pub fn implies(&self, other: Action) -> bool {
        match self {
            Action::Manage => true,
            Action::Create | Action::Update | Action::Delete => {
                matches!(other, Action::Read | Action::List)
            }
            Action::Read => other == Action::List,
            Action::List => false,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
