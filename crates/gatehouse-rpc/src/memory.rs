//! In-process service implementations for tests and local development.
//!
//! Both services keep their state behind a `parking_lot` lock. Failures can be
//! injected per method name (`"DeleteSession"`, `"GetUser"`, ...) to exercise
//! error paths without a network.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use gatehouse_core::{SessionId, UserId};

use crate::error::{Result, RpcCode, RpcError};
use crate::types::{NewSession, Session, UserRecord};
use crate::{IdentityService, SessionStore};

/// Injected failures keyed by method name.
#[derive(Debug, Default)]
struct Faults(RwLock<HashMap<&'static str, RpcError>>);

impl Faults {
    fn set(&self, method: &'static str, error: RpcError) {
        self.0.write().insert(method, error);
    }

    fn clear(&self, method: &str) {
        self.0.write().remove(method);
    }

    fn check(&self, method: &str) -> Result<()> {
        match self.0.read().get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// In-memory [`SessionStore`].
///
/// Sessions are kept in insertion order so listings come back oldest first,
/// matching the remote service.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<Vec<Session>>,
    faults: Faults,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `method` fail with `error` until cleared.
    pub fn fail(&self, method: &'static str, error: RpcError) {
        self.faults.set(method, error);
    }

    /// Stop failing calls to `method`.
    pub fn clear_failure(&self, method: &str) {
        self.faults.clear(method);
    }

    /// Snapshot of every stored session, revoked ones included.
    #[must_use]
    pub fn all(&self) -> Vec<Session> {
        self.sessions.read().clone()
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, session: NewSession) -> Result<Session> {
        self.faults.check("CreateSession")?;

        let mut sessions = self.sessions.write();
        if sessions.iter().any(|s| s.id == session.id) {
            return Err(RpcError::new(
                RpcCode::AlreadyExists,
                format!("session {} already exists", session.id),
            ));
        }

        let created = Session {
            id: session.id,
            user_email: session.user_email,
            refresh_token: session.refresh_token,
            is_revoked: false,
            expires_at: session.expires_at,
            created_at: Some(Utc::now()),
        };
        sessions.push(created.clone());
        Ok(created)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Session> {
        self.faults.check("GetSession")?;

        self.sessions
            .read()
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| RpcError::not_found(format!("session {id} not found")))
    }

    async fn list_active_sessions(&self, email: &str) -> Result<Vec<Session>> {
        self.faults.check("ListSessions")?;

        Ok(self
            .sessions
            .read()
            .iter()
            .filter(|s| s.user_email == email && !s.is_revoked)
            .cloned()
            .collect())
    }

    async fn revoke_session(&self, id: &SessionId) -> Result<()> {
        self.faults.check("RevokeSession")?;

        let mut sessions = self.sessions.write();
        let session = sessions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| RpcError::not_found(format!("session {id} not found")))?;
        session.is_revoked = true;
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        self.faults.check("DeleteSession")?;

        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|s| &s.id != id);
        if sessions.len() == before {
            return Err(RpcError::not_found(format!("session {id} not found")));
        }
        Ok(())
    }
}

/// In-memory [`IdentityService`].
#[derive(Debug, Default)]
pub struct MemoryIdentityService {
    users: RwLock<Vec<UserRecord>>,
    faults: Faults,
}

impl MemoryIdentityService {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user, keyed by email.
    pub fn insert(&self, user: UserRecord) {
        let mut users = self.users.write();
        users.retain(|u| u.email != user.email);
        users.push(user);
    }

    /// Make every call to `method` fail with `error` until cleared.
    pub fn fail(&self, method: &'static str, error: RpcError) {
        self.faults.set(method, error);
    }

    /// Stop failing calls to `method`.
    pub fn clear_failure(&self, method: &str) {
        self.faults.clear(method);
    }
}

#[async_trait]
impl IdentityService for MemoryIdentityService {
    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord> {
        self.faults.check("GetUser")?;

        self.users
            .read()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| RpcError::not_found("user not found"))
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<UserRecord> {
        self.faults.check("GetUser")?;

        self.users
            .read()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| RpcError::not_found("user not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gatehouse_core::TokenId;

    fn new_session(email: &str) -> NewSession {
        NewSession {
            id: SessionId::from(TokenId::generate()),
            user_email: email.to_string(),
            refresh_token: "r".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn listing_is_oldest_first_and_skips_revoked() {
        let store = MemorySessionStore::new();
        let first = store.create_session(new_session("a@x.com")).await.unwrap();
        let second = store.create_session(new_session("a@x.com")).await.unwrap();
        let third = store.create_session(new_session("a@x.com")).await.unwrap();
        store.create_session(new_session("b@x.com")).await.unwrap();

        store.revoke_session(&second.id).await.unwrap();

        let ids: Vec<_> = store
            .list_active_sessions("a@x.com")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![first.id, third.id]);
    }

    #[tokio::test]
    async fn delete_missing_session_is_not_found() {
        let store = MemorySessionStore::new();
        let err = store
            .delete_session(&SessionId::from(TokenId::generate()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failure_applies_until_cleared() {
        let store = MemorySessionStore::new();
        let session = store.create_session(new_session("a@x.com")).await.unwrap();

        store.fail("DeleteSession", RpcError::unavailable("down"));
        assert_eq!(
            store.delete_session(&session.id).await.unwrap_err().code,
            RpcCode::Unavailable
        );

        store.clear_failure("DeleteSession");
        store.delete_session(&session.id).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn identity_lookup() {
        let users = MemoryIdentityService::new();
        users.insert(UserRecord {
            id: UserId::new(1),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "hash".to_string(),
            is_admin: false,
        });

        assert_eq!(users.get_user_by_email("a@x.com").await.unwrap().id, UserId::new(1));
        assert!(users.get_user_by_id(UserId::new(2)).await.unwrap_err().is_not_found());
    }
}
