//! Token and credential primitives for gatehouse.
//!
//! This crate provides the cryptographic half of the authentication core:
//!
//! - Signing and verifying short-lived access tokens and long-lived refresh
//!   tokens (HS256 JWTs)
//! - Argon2 password hashing and constant-time verification
//!
//! Nothing here performs I/O. Verification is a pure check of signature and
//! expiry, so it is safe to run on every inbound request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│  TokenVerifier   │
//! │   middleware     │     │  (trait)         │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//! ┌──────────────────┐     ┌────────▼─────────┐
//! │   Auth flows     │────▶│   TokenMaker     │
//! │   (issue)        │     │   (HS256 key)    │
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gatehouse_auth::{AuthConfig, TokenKind, TokenMaker, TokenVerifier};
//! use gatehouse_core::UserId;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::with_secret("an-example-signing-key");
//! let maker = TokenMaker::new(&config)?;
//!
//! let (token, claims) = maker.issue(
//!     TokenKind::Access,
//!     UserId::new(1),
//!     "a@x.com",
//!     false,
//!     config.access_ttl(),
//! )?;
//! let verified = maker.verify(&token, TokenKind::Access)?;
//! assert_eq!(verified, claims);
//!
//! // An access token is never accepted where a refresh token is expected.
//! assert!(maker.verify(&token, TokenKind::Refresh).is_err());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;

use chrono::Duration;

pub mod error;
pub mod password;
pub mod token;

pub use error::{AuthError, Result};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKind, TokenMaker, TokenVerifier};

/// Configuration for token issuance.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC signing secret shared by issuance and verification.
    pub secret_key: String,
    /// Lifetime of access tokens, in seconds.
    pub access_ttl_seconds: i64,
    /// Lifetime of refresh tokens (and their sessions), in seconds.
    pub refresh_ttl_seconds: i64,
}

impl AuthConfig {
    /// Default configuration with the given signing secret.
    #[must_use]
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }

    /// Access token lifetime.
    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_ttl_seconds)
    }

    /// Refresh token lifetime.
    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_ttl_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_ttl_seconds: 15 * 60,       // 15 minutes
            refresh_ttl_seconds: 24 * 60 * 60, // 24 hours
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}
