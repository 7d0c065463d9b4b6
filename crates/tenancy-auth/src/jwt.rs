//! Key secret encoding
//!
//! A [`Tokenizer`] turns persisted [`Key`] metadata into the opaque secret
//! handed to the caller, and back into claims. [`JwtTokenizer`] signs the
//! claims as an HS256 JWT using the jsonwebtoken crate.
//!
//! Expiry is not checked here: the persisted key is authoritative, so a
//! decoded secret still has to be matched against the key store.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::warn;

use crate::claims::KeyClaims;
use crate::config::{generate_secret, AuthConfig};
use crate::error::{AuthError, AuthResult};
use crate::key::Key;

/// Encodes keys into opaque secrets and decodes them back.
pub trait Tokenizer: Send + Sync {
    /// Produce the secret for `key`.
    fn encode(&self, key: &Key) -> AuthResult<String>;

    /// Verify the signature of `secret` and return its claims.
    ///
    /// Fails with `Unauthenticated` for anything that was not produced by
    /// this tokenizer.
    fn decode(&self, secret: &str) -> AuthResult<KeyClaims>;
}

/// HS256 JWT tokenizer.
pub struct JwtTokenizer {
    audience: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenizer")
            .field("audience", &self.audience)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtTokenizer {
    /// Create a tokenizer with an HMAC secret.
    pub fn new(secret: &str, audience: impl Into<String>) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::ConfigError("Secret required for HMAC".to_string()));
        }

        Ok(Self {
            audience: audience.into(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Create a tokenizer from configuration.
    ///
    /// Without a configured secret an ephemeral one is generated; secrets
    /// issued with it do not survive a restart.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        match &config.jwt_secret {
            Some(secret) => Self::new(secret, config.jwt_audience.clone()),
            None => {
                warn!("TENANCY_JWT_SECRET not set, using an ephemeral signing secret");
                Self::new(&generate_secret(), config.jwt_audience.clone())
            }
        }
    }

    /// Audience embedded in every secret.
    pub fn audience(&self) -> &str {
        &self.audience
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "iss", "aud"]);
        validation.set_audience(&[&self.audience]);
        validation
    }
}

impl Tokenizer for JwtTokenizer {
    fn encode(&self, key: &Key) -> AuthResult<String> {
        let claims = KeyClaims::for_key(key, self.audience.clone());
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    fn decode(&self, secret: &str) -> AuthResult<KeyClaims> {
        let data = decode::<KeyClaims>(secret, &self.decoding_key, &self.validation()).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::unauthenticated("Invalid signature")
                }
                jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                    AuthError::unauthenticated("Invalid audience")
                }
                _ => AuthError::unauthenticated("Malformed token"),
            },
        )?;

        Ok(data.claims)
    }
}
