//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token has expired.
    #[error("token expired")]
    TokenExpired,

    /// The token signature does not match the signing key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token is malformed or carries unusable claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// No signing key was configured.
    #[error("signing key is not configured")]
    MissingSigningKey,

    /// Signing or hashing failed.
    #[error("internal error: {0}")]
    Internal(String),
}
