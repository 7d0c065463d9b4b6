//! Access key metadata
//!
//! A key is the persisted half of a credential. The secret handed to the
//! caller is derived from it by a [`Tokenizer`](crate::jwt::Tokenizer) and is
//! never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of access key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// Session key obtained by logging in (short-lived)
    #[default]
    Login,

    /// Password recovery key (very short-lived)
    Recovery,

    /// API key, optionally non-expiring
    Api,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Login => "login",
            KeyType::Recovery => "recovery",
            KeyType::Api => "api",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "login" => Some(KeyType::Login),
            "recovery" => Some(KeyType::Recovery),
            "api" | "api_key" => Some(KeyType::Api),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted key metadata. Primary key is `(id, issuer_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Key {
    /// Key ID
    pub id: Uuid,

    /// Key type
    pub key_type: KeyType,

    /// User the key authenticates as
    pub subject: Uuid,

    /// User who minted the key
    pub issuer_id: Uuid,

    /// When the key was issued
    pub issued_at: DateTime<Utc>,

    /// When the key stops being valid, `None` for non-expiring keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Key {
    /// Create key metadata with a fresh ID.
    pub fn new(
        key_type: KeyType,
        subject: Uuid,
        issuer_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            key_type,
            subject,
            issuer_id,
            issued_at,
            expires_at,
        }
    }

    /// A key is expired once `now` reaches its expiry; there is no leeway.
    ///
    /// ```
    /// use chrono::Utc;
    /// use tenancy_auth::{Key, KeyType};
    /// use uuid::Uuid;
    ///
    /// let now = Utc::now();
    /// let user = Uuid::now_v7();
    /// assert!(Key::new(KeyType::Api, user, user, now, Some(now)).is_expired(now));
    /// assert!(!Key::new(KeyType::Api, user, user, now, None).is_expired(now));
    /// ```
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Composite primary key.
    pub fn key(&self) -> (Uuid, Uuid) {
        (self.id, self.issuer_id)
    }
}

/// Request to mint a key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewKey {
    /// Key type
    pub key_type: KeyType,

    /// Subject, defaults to the caller for API keys
    pub subject: Option<Uuid>,

    /// Explicit expiry; for login and recovery keys the configured duration
    /// applies when absent, for API keys absence means "never"
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewKey {
    /// Login key for `subject`.
    pub fn login(subject: Uuid) -> Self {
        Self {
            key_type: KeyType::Login,
            subject: Some(subject),
            expires_at: None,
        }
    }

    /// Recovery key for `subject`.
    pub fn recovery(subject: Uuid) -> Self {
        Self {
            key_type: KeyType::Recovery,
            subject: Some(subject),
            expires_at: None,
        }
    }

    /// API key for the caller.
    pub fn api() -> Self {
        Self {
            key_type: KeyType::Api,
            subject: None,
            expires_at: None,
        }
    }

    pub fn with_subject(mut self, subject: Uuid) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Identity resolved from a live secret.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Authenticated user
    pub user_id: Uuid,
    /// Key the secret belongs to
    pub key_id: Uuid,
    /// Type of that key
    pub key_type: KeyType,
    /// User who minted the key
    pub issuer_id: Uuid,
}

impl From<&Key> for Identity {
    fn from(key: &Key) -> Self {
        Self {
            user_id: key.subject,
            key_id: key.id,
            key_type: key.key_type,
            issuer_id: key.issuer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_key_expiry_boundary() {
        let now = Utc::now();
        let user = Uuid::now_v7();
        let key = Key::new(KeyType::Login, user, user, now, Some(now + Duration::seconds(1)));

        assert!(!key.is_expired(now));
        assert!(key.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn test_identity_from_key() {
        let now = Utc::now();
        let (subject, issuer) = (Uuid::now_v7(), Uuid::now_v7());
        let key = Key::new(KeyType::Api, subject, issuer, now, None);

        let identity = Identity::from(&key);
        assert_eq!(identity.user_id, subject);
        assert_eq!(identity.issuer_id, issuer);
        assert_eq!(identity.key_id, key.id);
    }

    #[test]
    fn test_key_type_parse() {
        for kt in [KeyType::Login, KeyType::Recovery, KeyType::Api] {
            assert_eq!(KeyType::parse(kt.as_str()), Some(kt));
        }
        assert_eq!(KeyType::parse("refresh"), None);
    }
}
