//! Clients for the remote services gatehouse depends on.
//!
//! The gateway owns no durable state. Sessions live in a remote session
//! service and user records in a remote user service; this crate defines the
//! capabilities the rest of the workspace needs from them and the
//! JSON-over-HTTP clients that provide those capabilities.
//!
//! # Services
//!
//! | Trait | Remote service | Methods |
//! |-------|----------------|---------|
//! | [`SessionStore`] | `SessionService` | `CreateSession`, `GetSession`, `ListSessions`, `RevokeSession`, `DeleteSession` |
//! | [`IdentityService`] | `UserService` | `GetUser` |
//!
//! With the `test-utils` feature, [`memory`] provides in-process
//! implementations with failure injection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod types;

pub use client::{CallKind, CallTimeouts, RpcClient};
pub use error::{Result, RpcCode, RpcError};
pub use http::{HttpIdentityService, HttpSessionStore};
pub use types::{NewSession, Session, UserRecord};

use async_trait::async_trait;
use gatehouse_core::{SessionId, UserId};

/// Remote session storage.
///
/// The session service is the source of truth for session existence,
/// ownership, and revocation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Register a new session.
    ///
    /// # Errors
    ///
    /// Returns `ALREADY_EXISTS` if a session with the same ID exists, or the
    /// transport error if the call fails.
    async fn create_session(&self, session: NewSession) -> Result<Session>;

    /// Fetch a session by ID.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if no such session exists.
    async fn get_session(&self, id: &SessionId) -> Result<Session>;

    /// List the non-revoked sessions of an identity, oldest first.
    ///
    /// An identity with no sessions yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    async fn list_active_sessions(&self, email: &str) -> Result<Vec<Session>>;

    /// Mark a session revoked. Revoking an already revoked session succeeds.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if no such session exists.
    async fn revoke_session(&self, id: &SessionId) -> Result<()>;

    /// Remove a session.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if no such session exists.
    async fn delete_session(&self, id: &SessionId) -> Result<()>;
}

/// Remote user directory.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if no user has this email.
    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord>;

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if no user has this ID.
    async fn get_user_by_id(&self, id: UserId) -> Result<UserRecord>;
}
