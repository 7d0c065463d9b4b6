//! Configuration for key issuance and invite lifetimes.
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development. A missing signing secret is replaced by an
//! ephemeral one, which [`AuthConfig::validate_for_production`] rejects.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Duration;
use rand::RngCore;

use crate::error::{AuthError, AuthResult};
use crate::key::KeyType;

/// Minimum length of a production signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Tenancy core configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign key secrets
    pub jwt_secret: Option<String>,

    /// Audience embedded in and required from every key secret
    pub jwt_audience: String,

    /// Default lifetime of login keys
    pub login_key_ttl: Duration,

    /// Default lifetime of recovery keys
    pub recovery_key_ttl: Duration,

    /// Lifetime of org invites, re-armed at activation
    pub org_invite_ttl: Duration,

    /// Lifetime of platform invites
    pub platform_invite_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_audience", &self.jwt_audience)
            .field("login_key_ttl", &self.login_key_ttl)
            .field("recovery_key_ttl", &self.recovery_key_ttl)
            .field("org_invite_ttl", &self.org_invite_ttl)
            .field("platform_invite_ttl", &self.platform_invite_ttl)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_audience: "tenancy".to_string(),
            login_key_ttl: Duration::hours(10),
            recovery_key_ttl: Duration::minutes(5),
            org_invite_ttl: Duration::days(7),
            platform_invite_ttl: Duration::days(7),
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TENANCY_JWT_SECRET`: HMAC signing secret (no default)
    /// - `TENANCY_JWT_AUDIENCE`: audience of key secrets (default: tenancy)
    /// - `TENANCY_LOGIN_KEY_TTL_SECS`: login key lifetime (default: 36000)
    /// - `TENANCY_RECOVERY_KEY_TTL_SECS`: recovery key lifetime (default: 300)
    /// - `TENANCY_ORG_INVITE_TTL_SECS`: org invite lifetime (default: 604800)
    /// - `TENANCY_PLATFORM_INVITE_TTL_SECS`: platform invite lifetime (default: 604800)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: std::env::var("TENANCY_JWT_SECRET").ok().filter(|s| !s.is_empty()),
            jwt_audience: std::env::var("TENANCY_JWT_AUDIENCE").unwrap_or(default.jwt_audience),
            login_key_ttl: env_secs("TENANCY_LOGIN_KEY_TTL_SECS").unwrap_or(default.login_key_ttl),
            recovery_key_ttl: env_secs("TENANCY_RECOVERY_KEY_TTL_SECS")
                .unwrap_or(default.recovery_key_ttl),
            org_invite_ttl: env_secs("TENANCY_ORG_INVITE_TTL_SECS")
                .unwrap_or(default.org_invite_ttl),
            platform_invite_ttl: env_secs("TENANCY_PLATFORM_INVITE_TTL_SECS")
                .unwrap_or(default.platform_invite_ttl),
        }
    }

    /// Set the signing secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    /// Default lifetime for a key type, `None` when the type never expires
    /// by default.
    pub fn key_ttl(&self, key_type: KeyType) -> Option<Duration> {
        match key_type {
            KeyType::Login => Some(self.login_key_ttl),
            KeyType::Recovery => Some(self.recovery_key_ttl),
            KeyType::Api => None,
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> AuthResult<()> {
        let ttls = [
            ("login_key_ttl", self.login_key_ttl),
            ("recovery_key_ttl", self.recovery_key_ttl),
            ("org_invite_ttl", self.org_invite_ttl),
            ("platform_invite_ttl", self.platform_invite_ttl),
        ];
        for (name, ttl) in ttls {
            if ttl <= Duration::zero() {
                return Err(AuthError::ConfigError(format!("{} must be positive", name)));
            }
        }
        if self.jwt_audience.trim().is_empty() {
            return Err(AuthError::ConfigError("jwt_audience must not be empty".to_string()));
        }
        Ok(())
    }

    /// Validate that all required configuration is present for production.
    pub fn validate_for_production(&self) -> AuthResult<()> {
        self.validate()?;
        match &self.jwt_secret {
            None => Err(AuthError::ConfigError(
                "Missing required environment variable: TENANCY_JWT_SECRET".to_string(),
            )),
            Some(secret) if secret.len() < MIN_SECRET_LEN => Err(AuthError::ConfigError(format!(
                "TENANCY_JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            ))),
            Some(_) => Ok(()),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .map(Duration::seconds)
}

/// Generate a random URL-safe secret, for development and tests.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.login_key_ttl, Duration::hours(10));
        assert_eq!(config.recovery_key_ttl, Duration::minutes(5));
        assert_eq!(config.key_ttl(KeyType::Api), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let config = AuthConfig::default();
        assert!(matches!(
            config.validate_for_production(),
            Err(AuthError::ConfigError(_))
        ));

        let config = AuthConfig::default().with_secret("short");
        assert!(config.validate_for_production().is_err());

        let config = AuthConfig::default().with_secret(generate_secret());
        assert!(config.validate_for_production().is_ok());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let config = AuthConfig {
            org_invite_ttl: Duration::zero(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generated_secrets_differ() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert!(a.len() >= MIN_SECRET_LEN);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthConfig::default().with_secret("super-secret-value");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("REDACTED"));
    }
}
