//! # Tenancy Authentication
//!
//! Credentials and shared plumbing of the tenancy core.
//!
//! ## Overview
//!
//! - **Keys**: login, recovery and API key metadata ([`Key`], [`NewKey`])
//! - **Secrets**: opaque HS256 JWTs produced by a [`Tokenizer`]
//! - **Errors**: the [`AuthError`] taxonomy every layer speaks
//! - **Configuration**: key and invite lifetimes loaded from the environment
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Utc;
//! use tenancy_auth::{AuthConfig, JwtTokenizer, Key, KeyType, Tokenizer};
//! use uuid::Uuid;
//!
//! let config = AuthConfig::default().with_secret("a-development-secret-of-32-chars!");
//! let tokenizer = JwtTokenizer::from_config(&config).unwrap();
//!
//! let user = Uuid::now_v7();
//! let key = Key::new(KeyType::Api, user, user, Utc::now(), None);
//! let secret = tokenizer.encode(&key).unwrap();
//! assert_eq!(tokenizer.decode(&secret).unwrap().key_id().unwrap(), key.id);
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod jwt;
pub mod key;

// Re-export main types
pub use claims::KeyClaims;
pub use config::{generate_secret, AuthConfig};
pub use error::{AuthError, AuthResult};
pub use jwt::{JwtTokenizer, Tokenizer};
pub use key::{Identity, Key, KeyType, NewKey};
