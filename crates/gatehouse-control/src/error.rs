//! Error types for the authentication flows.

use gatehouse_auth::AuthError;
use gatehouse_rpc::RpcError;
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in authentication and session operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The request is missing or has malformed fields.
    #[error("{0}")]
    Validation(String),

    /// Unknown user or wrong password. Both read the same to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The caller is not authenticated.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller may not act on this resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The refresh token's session has been revoked.
    #[error("session is revoked")]
    SessionRevoked,

    /// The refresh token's email does not match its session.
    #[error("invalid session")]
    SessionMismatch,

    /// Token verification or signing failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A remote service call failed.
    #[error("remote call failed: {0}")]
    Rpc(#[from] RpcError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}
