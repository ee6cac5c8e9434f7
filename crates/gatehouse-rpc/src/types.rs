//! Records exchanged with the remote services.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::{SessionId, UserId};

/// A session record owned by the session service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    /// Session ID, equal to the refresh token's `jti`.
    pub id: SessionId,
    /// Email of the owning identity.
    pub user_email: String,
    /// The refresh token this session was created for.
    pub refresh_token: String,
    /// Whether the session has been revoked.
    #[serde(default)]
    pub is_revoked: bool,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
    /// When the session service recorded the session.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_email", &self.user_email)
            .field("refresh_token", &"<redacted>")
            .field("is_revoked", &self.is_revoked)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Request to register a new session.
#[derive(Clone, Serialize)]
pub struct NewSession {
    /// Session ID, equal to the refresh token's `jti`.
    pub id: SessionId,
    /// Email of the owning identity.
    pub user_email: String,
    /// The refresh token the session is created for.
    pub refresh_token: String,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for NewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewSession")
            .field("id", &self.id)
            .field("user_email", &self.user_email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// A user record as returned by the user service.
///
/// Carries the stored password hash, so it is never serialized back out.
#[derive(Clone, Deserialize)]
pub struct UserRecord {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Stored password hash.
    pub password: String,
    /// Whether the user is an administrator.
    #[serde(default)]
    pub is_admin: bool,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("is_admin", &self.is_admin)
            .finish_non_exhaustive()
    }
}
