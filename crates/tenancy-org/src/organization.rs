//! Organization domain models
//!
//! Organizations are the tenant boundary: they own memberships, group
//! associations and invites. This module also holds the listing filter and
//! the JSON containment check used for metadata queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Free-form organization metadata, always a JSON object.
pub type Metadata = serde_json::Map<String, Value>;

/// An organization represents a tenant in the multi-tenant system.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use uuid::Uuid;
/// use tenancy_org::{NewOrg, Org};
///
/// let owner_id = Uuid::now_v7();
/// let org = Org::new(NewOrg::new("Acme Corp"), owner_id, Utc::now()).unwrap();
/// assert_eq!(org.name, "Acme Corp");
/// assert_eq!(org.owner_id, owner_id);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Org {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Owner user ID, immutable after creation
    pub owner_id: Uuid,

    /// Human-readable name, trimmed and non-empty
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: String,

    /// Custom metadata for extensibility
    #[serde(default)]
    pub metadata: Metadata,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Org {
    /// Creates a new organization owned by `owner_id`.
    ///
    /// Returns `None` when the requested name is blank.
    pub fn new(new: NewOrg, owner_id: Uuid, now: DateTime<Utc>) -> Option<Self> {
        let name = normalize_name(&new.name)?;
        Some(Self {
            id: Uuid::now_v7(),
            owner_id,
            name,
            description: new.description,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an update in place.
    ///
    /// Name and description are replaced when present, metadata keys are
    /// merged (update keys overwrite). Returns `None` when the new name is
    /// blank, leaving `self` untouched.
    pub fn apply(&mut self, update: OrgUpdate, now: DateTime<Utc>) -> Option<()> {
        let name = match update.name {
            Some(name) => Some(normalize_name(&name)?),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        self.metadata.extend(update.metadata);
        self.updated_at = now;
        Some(())
    }
}

fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Request to create an organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewOrg {
    /// Organization name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: String,

    /// Initial metadata, stored as given
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewOrg {
    /// Create a request with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Partial update of an organization. The owner cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrgUpdate {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// Metadata entries merged into the existing map
    #[serde(default)]
    pub metadata: Metadata,
}

/// Filter for organization listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrgFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,

    /// JSON object the org metadata must contain
    pub metadata: Option<Metadata>,
}

impl OrgFilter {
    /// Check whether an organization passes this filter.
    pub fn matches(&self, org: &Org) -> bool {
        if let Some(name) = &self.name {
            if !org.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }

        match &self.metadata {
            Some(needle) => object_contains(&org.metadata, needle),
            None => true,
        }
    }
}

/// JSON containment in the sense of a `@>` operator: every key of `needle`
/// must be present in `haystack` with a containing value.
pub fn object_contains(haystack: &Metadata, needle: &Metadata) -> bool {
    needle.iter().all(|(key, expected)| {
        haystack
            .get(key)
            .is_some_and(|actual| value_contains(actual, expected))
    })
}

fn value_contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Object(h), Value::Object(n)) => object_contains(h, n),
        // every needle element must be contained by some haystack element
        (Value::Array(h), Value::Array(n)) => {
            n.iter().all(|ne| h.iter().any(|he| value_contains(he, ne)))
        }
        (Value::Array(h), scalar) if !scalar.is_object() => h.iter().any(|he| he == scalar),
        (h, n) => h == n,
    }
}
