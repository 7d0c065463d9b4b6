//! Error types for the tenancy core
//!
//! Every store backend translates its own failures into [`AuthError`], and
//! the service layer propagates these variants verbatim.

use thiserror::Error;

/// Error taxonomy shared by the stores, the invite engine and the facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Invalid identifier, shape or value in a request
    #[error("Malformed entity: {0}")]
    MalformedEntity(String),

    /// Entity absent for the given scope
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or state violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid, expired, revoked or unknown key
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not permitted
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Organization deletion blocked by memberships or group associations
    #[error("Organization {0} is not empty")]
    OrgNotEmpty(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for tenancy operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        AuthError::MalformedEntity(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AuthError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AuthError::Conflict(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        AuthError::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AuthError::Forbidden(msg.into())
    }

    /// Check if this error should be logged at error level.
    ///
    /// Taxonomy errors are expected outcomes of bad requests and should not
    /// be logged as errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Internal(_) | AuthError::ConfigError(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MalformedEntity(_) => 400,
            AuthError::Unauthenticated(_) => 401,
            AuthError::Forbidden(_) => 403,
            AuthError::NotFound(_) => 404,
            AuthError::Conflict(_) | AuthError::OrgNotEmpty(_) => 409,
            AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedEntity(_) => "MALFORMED_ENTITY",
            AuthError::NotFound(_) => "NOT_FOUND",
            AuthError::Conflict(_) => "CONFLICT",
            AuthError::Unauthenticated(_) => "UNAUTHENTICATED",
            AuthError::Forbidden(_) => "FORBIDDEN",
            AuthError::OrgNotEmpty(_) => "ORG_NOT_EMPTY",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
