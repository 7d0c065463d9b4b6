//! JWT claims carried by key secrets
//!
//! The claims mirror the persisted [`Key`] so a secret can be resolved back
//! to its row. Callers treat the encoded secret as opaque.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::key::{Key, KeyType};

/// Claims of a key secret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyClaims {
    /// JWT ID, the key ID
    pub jti: String,

    /// Issuer, the user who minted the key
    pub iss: String,

    /// Subject, the user the key authenticates as
    pub sub: String,

    /// Audience, the deployment the key is valid for
    pub aud: String,

    /// Key type
    pub typ: KeyType,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp), absent for non-expiring keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl KeyClaims {
    /// Build claims for `key`, bound to `audience`.
    pub fn for_key(key: &Key, audience: impl Into<String>) -> Self {
        Self {
            jti: key.id.to_string(),
            iss: key.issuer_id.to_string(),
            sub: key.subject.to_string(),
            aud: audience.into(),
            typ: key.key_type,
            iat: key.issued_at.timestamp(),
            exp: key.expires_at.map(|exp| exp.timestamp()),
        }
    }

    /// Key ID as UUID.
    pub fn key_id(&self) -> AuthResult<Uuid> {
        parse_claim("jti", &self.jti)
    }

    /// Issuer ID as UUID.
    pub fn issuer_id(&self) -> AuthResult<Uuid> {
        parse_claim("iss", &self.iss)
    }

    /// Subject as UUID.
    pub fn subject(&self) -> AuthResult<Uuid> {
        parse_claim("sub", &self.sub)
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }
}

fn parse_claim(name: &str, value: &str) -> AuthResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| AuthError::unauthenticated(format!("claim {} is not a valid id", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_mirror_key() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let user = Uuid::now_v7();
        let key = Key::new(KeyType::Recovery, user, user, now, Some(now + chrono::Duration::minutes(5)));

        let claims = KeyClaims::for_key(&key, "tenancy");
        assert_eq!(claims.key_id().unwrap(), key.id);
        assert_eq!(claims.subject().unwrap(), user);
        assert_eq!(claims.issuer_id().unwrap(), user);
        assert_eq!(claims.expires_at(), key.expires_at);
        assert_eq!(claims.iat, 1_700_000_000);
    }

    #[test]
    fn test_non_expiring_claims_skip_exp() {
        let user = Uuid::now_v7();
        let key = Key::new(KeyType::Api, user, user, Utc::now(), None);
        let json = serde_json::to_value(KeyClaims::for_key(&key, "tenancy")).unwrap();
        assert!(json.get("exp").is_none());
        assert_eq!(json["typ"], "api");
    }

    #[test]
    fn test_bad_claim_ids() {
        let user = Uuid::now_v7();
        let key = Key::new(KeyType::Api, user, user, Utc::now(), None);
        let mut claims = KeyClaims::for_key(&key, "tenancy");
        claims.sub = "not-a-uuid".into();
        assert!(matches!(claims.subject(), Err(AuthError::Unauthenticated(_))));
    }
}
