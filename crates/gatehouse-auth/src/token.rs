//! Token issuance and verification.
//!
//! Tokens are HS256-signed JWTs. Access and refresh tokens share the same
//! claim layout but carry their [`TokenKind`] in `typ`, and verification
//! rejects a token of the wrong kind. A refresh token's `jti` doubles as the
//! identifier of the session created for it.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use gatehouse_core::{SessionId, TokenId, UserId};

use crate::error::{AuthError, Result};
use crate::AuthConfig;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Authenticates requests. Short-lived.
    Access,
    /// Only mints new access tokens, and only while its session is live.
    Refresh,
}

impl TokenKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims embedded in every signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric user ID.
    pub id: UserId,
    /// User email.
    pub email: String,
    /// Whether the user holds administrator privileges.
    pub is_admin: bool,
    /// Unique token identifier.
    pub jti: TokenId,
    /// Access or refresh.
    pub typ: TokenKind,
    /// Subject (the user's email).
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// When the token was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// When the token expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// The session this token is bound to, when it is a refresh token.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        SessionId::from(self.jti)
    }
}

/// Trait for verifying tokens.
///
/// Verification is a pure signature and expiry check and never performs I/O.
pub trait TokenVerifier: Send + Sync {
    /// Verify a token of the given kind and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenExpired` past the expiry, `InvalidSignature` when the
    /// signature does not match, and `InvalidToken` for anything malformed
    /// or for a token of another kind.
    fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims>;
}

/// Issues and verifies HS256 tokens with a single process-wide secret.
pub struct TokenMaker {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenMaker {
    /// Create a token maker from the configured signing secret.
    ///
    /// # Errors
    ///
    /// Returns `MissingSigningKey` if the secret is empty.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.secret_key.trim().is_empty() {
            return Err(AuthError::MissingSigningKey);
        }

        let secret = config.secret_key.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Sign a new token of `kind` for the given identity, valid for `ttl`
    /// from now.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if signing fails.
    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: UserId,
        email: &str,
        is_admin: bool,
        ttl: Duration,
    ) -> Result<(String, Claims)> {
        self.issue_at(kind, user_id, email, is_admin, ttl, Utc::now())
    }

    fn issue_at(
        &self,
        kind: TokenKind,
        user_id: UserId,
        email: &str,
        is_admin: bool,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims)> {
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            is_admin,
            jti: TokenId::generate(),
            typ: kind,
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))?;

        Ok((token, claims))
    }
}

impl TokenVerifier for TokenMaker {
    fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let token_data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        let claims = token_data.claims;
        if claims.typ != kind {
            return Err(AuthError::InvalidToken(format!(
                "expected {kind} token, got {}",
                claims.typ
            )));
        }

        Ok(claims)
    }
}
