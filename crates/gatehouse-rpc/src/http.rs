//! HTTP implementations of the service traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gatehouse_core::{SessionId, UserId};

use crate::client::{CallKind, CallTimeouts, RpcClient};
use crate::error::Result;
use crate::types::{NewSession, Session, UserRecord};
use crate::{IdentityService, SessionStore};

const SESSION_SERVICE: &str = "SessionService";
const USER_SERVICE: &str = "UserService";

#[derive(Debug, Serialize)]
struct SessionIdRequest<'a> {
    id: &'a SessionId,
}

#[derive(Debug, Serialize)]
struct ListSessionsRequest<'a> {
    user_email: &'a str,
    include_revoked: bool,
}

#[derive(Debug, Deserialize)]
struct ListSessionsResponse {
    #[serde(default)]
    sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum GetUserRequest<'a> {
    Email(&'a str),
    Id(UserId),
}

/// [`SessionStore`] backed by the remote `SessionService`.
#[derive(Debug, Clone)]
pub struct HttpSessionStore {
    client: RpcClient,
}

impl HttpSessionStore {
    /// Create a store talking to the session service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeouts: CallTimeouts) -> Self {
        Self {
            client: RpcClient::new(base_url, SESSION_SERVICE, timeouts),
        }
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn create_session(&self, session: NewSession) -> Result<Session> {
        let created: Session = self
            .client
            .call("CreateSession", CallKind::Unary, &session)
            .await?;
        tracing::debug!(session_id = %created.id, "Created session");
        Ok(created)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Session> {
        self.client
            .call("GetSession", CallKind::Unary, &SessionIdRequest { id })
            .await
    }

    async fn list_active_sessions(&self, email: &str) -> Result<Vec<Session>> {
        let request = ListSessionsRequest {
            user_email: email,
            include_revoked: false,
        };
        let response: ListSessionsResponse = self
            .client
            .call("ListSessions", CallKind::Bulk, &request)
            .await?;

        // Filter again in case the service ignores `include_revoked`.
        Ok(response
            .sessions
            .into_iter()
            .filter(|s| !s.is_revoked)
            .collect())
    }

    async fn revoke_session(&self, id: &SessionId) -> Result<()> {
        self.client
            .call_empty("RevokeSession", CallKind::Unary, &SessionIdRequest { id })
            .await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        self.client
            .call_empty("DeleteSession", CallKind::Unary, &SessionIdRequest { id })
            .await
    }
}

/// [`IdentityService`] backed by the remote `UserService`.
#[derive(Debug, Clone)]
pub struct HttpIdentityService {
    client: RpcClient,
}

impl HttpIdentityService {
    /// Create a client for the user service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeouts: CallTimeouts) -> Self {
        Self {
            client: RpcClient::new(base_url, USER_SERVICE, timeouts),
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord> {
        self.client
            .call("GetUser", CallKind::Unary, &GetUserRequest::Email(email))
            .await
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<UserRecord> {
        self.client
            .call("GetUser", CallKind::Unary, &GetUserRequest::Id(id))
            .await
    }
}
