//! Session coordination over the remote session store.
//!
//! Sessions are owned by the session service. The coordinator adds the
//! per-identity cap: once a new session pushes an identity over the limit, the
//! oldest still-active session is deleted. Eviction is best effort and never
//! blocks the session that triggered it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use gatehouse_core::SessionId;
use gatehouse_rpc::{NewSession, RpcError, Session, SessionStore};

/// Applies the session cap on top of a [`SessionStore`].
pub struct SessionCoordinator<S: SessionStore> {
    store: Arc<S>,
    max_sessions: usize,
}

impl<S: SessionStore> SessionCoordinator<S> {
    /// Create a coordinator allowing `max_sessions` active sessions per identity.
    #[must_use]
    pub fn new(store: Arc<S>, max_sessions: usize) -> Self {
        Self {
            store,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Register a session, then evict the identity's oldest session if the cap
    /// is now exceeded.
    ///
    /// # Errors
    ///
    /// Returns the store error if the session cannot be created. Eviction
    /// failures are logged and never returned.
    pub async fn create(
        &self,
        id: SessionId,
        email: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, RpcError> {
        let session = self
            .store
            .create_session(NewSession {
                id,
                user_email: email.to_string(),
                refresh_token: refresh_token.to_string(),
                expires_at,
            })
            .await?;

        self.evict_over_cap(&session).await;

        Ok(session)
    }

    async fn evict_over_cap(&self, created: &Session) {
        let active = match self.store.list_active_sessions(&created.user_email).await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(
                    email = %created.user_email,
                    error = %e,
                    "Could not list sessions for eviction"
                );
                return;
            }
        };

        if active.len() <= self.max_sessions {
            return;
        }

        // Listing is oldest first.
        let Some(oldest) = active.iter().find(|s| s.id != created.id) else {
            return;
        };

        match self.store.delete_session(&oldest.id).await {
            Ok(()) => tracing::info!(
                email = %created.user_email,
                evicted = %oldest.id,
                active = active.len(),
                limit = self.max_sessions,
                "Evicted oldest session"
            ),
            Err(e) => tracing::warn!(
                email = %created.user_email,
                session_id = %oldest.id,
                error = %e,
                "Failed to evict oldest session"
            ),
        }
    }

    /// Fetch a session.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if the session does not exist.
    pub async fn get(&self, id: &SessionId) -> Result<Session, RpcError> {
        self.store.get_session(id).await
    }

    /// List an identity's non-revoked sessions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing fails.
    pub async fn list_active_by_identity(&self, email: &str) -> Result<Vec<Session>, RpcError> {
        self.store.list_active_sessions(email).await
    }

    /// Mark a session revoked.
    ///
    /// # Errors
    ///
    /// Returns the store error, including `NOT_FOUND`.
    pub async fn revoke(&self, id: &SessionId) -> Result<(), RpcError> {
        self.store.revoke_session(id).await?;
        tracing::info!(session_id = %id, "Revoked session");
        Ok(())
    }

    /// Delete a session. Deleting an absent session succeeds.
    ///
    /// # Errors
    ///
    /// Returns any store error other than `NOT_FOUND`.
    pub async fn delete(&self, id: &SessionId) -> Result<(), RpcError> {
        match self.store.delete_session(id).await {
            Ok(()) => {
                tracing::info!(session_id = %id, "Deleted session");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(session_id = %id, "Session already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
