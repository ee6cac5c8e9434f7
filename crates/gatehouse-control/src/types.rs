//! Request and response types for the authentication flows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::{SessionId, UserId};
use gatehouse_rpc::{Session, UserRecord};

/// Configuration for session coordination.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Maximum number of non-revoked sessions one identity may hold.
    pub max_sessions_per_identity: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_identity: 3,
        }
    }
}

/// Login request body.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Plaintext password.
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Public projection of a user record. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Whether the user is an administrator.
    pub is_admin: bool,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    /// The session created for this login.
    pub session_id: SessionId,
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_token_expires_at: DateTime<Utc>,
    /// Refresh token (and session) expiry.
    pub refresh_token_expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: UserProfile,
}

/// Result of a successful refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    /// Newly signed access token.
    pub access_token: String,
    /// Access token expiry.
    pub access_token_expires_at: DateTime<Utc>,
}

/// A session as shown to administrators. Omits the refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session ID.
    pub id: SessionId,
    /// Owning identity.
    pub user_email: String,
    /// Whether the session has been revoked.
    pub is_revoked: bool,
    /// Session expiry.
    pub expires_at: DateTime<Utc>,
    /// When the session was created, if the store reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionSummary {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            user_email: session.user_email,
            is_revoked: session.is_revoked,
            expires_at: session.expires_at,
            created_at: session.created_at,
        }
    }
}
