//! Authentication flows: login, refresh, logout, revoke.
//!
//! This module provides the `AuthControl` trait and the `AuthService`
//! implementation that ties the token engine, the session coordinator and the
//! credential validator together.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use gatehouse_auth::{AuthConfig, Claims, TokenKind, TokenMaker, TokenVerifier};
use gatehouse_core::SessionId;
use gatehouse_rpc::{IdentityService, SessionStore};

use crate::credentials::CredentialValidator;
use crate::error::{ControlError, Result};
use crate::session::SessionCoordinator;
use crate::types::{
    ControlConfig, LoginOutcome, LoginRequest, RefreshOutcome, SessionSummary, UserProfile,
};

/// Trait defining the authentication operations.
///
/// The gateway holds this behind an `Arc` so tests can substitute their own
/// implementation.
#[async_trait]
pub trait AuthControl: Send + Sync {
    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Authenticate with email and password and open a new session.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if either field is blank, `InvalidCredentials`
    /// for an unknown user or wrong password, and `Internal` if the session
    /// cannot be created.
    async fn login(&self, request: LoginRequest) -> Result<LoginOutcome>;

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated.
    ///
    /// # Errors
    ///
    /// Returns `Auth` if the token does not verify as a refresh token, `Rpc`
    /// if the session
    /// cannot be loaded, `SessionRevoked` if it was revoked, and
    /// `SessionMismatch` if it belongs to a different identity.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome>;

    // =========================================================================
    // Authenticated Operations
    // =========================================================================

    /// End the caller's session.
    ///
    /// The session is taken from `cookie_session`, falling back to the access
    /// token's `jti`. Never fails: delete errors are logged and dropped.
    async fn logout(&self, claims: &Claims, cookie_session: Option<SessionId>);

    /// Revoke the caller's session and return its ID.
    ///
    /// The session is resolved the same way as for logout. Sessions are keyed
    /// by the refresh token's `jti`, so the access-token fallback never names
    /// a live session: a caller without a `session_id` cookie gets `Rpc`
    /// (`NOT_FOUND`) and should log out instead.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if a cookie-named session belongs to someone else,
    /// and `Rpc` if the session service rejects the revocation.
    async fn revoke(&self, claims: &Claims, cookie_session: Option<SessionId>)
        -> Result<SessionId>;

    /// The caller's public profile.
    ///
    /// # Errors
    ///
    /// Returns `Rpc` (`NOT_FOUND`) if the user no longer exists.
    async fn me(&self, claims: &Claims) -> Result<UserProfile>;

    // =========================================================================
    // Admin Operations
    // =========================================================================

    /// List the active sessions of any identity.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `email` is blank.
    async fn list_sessions(&self, email: &str) -> Result<Vec<SessionSummary>>;

    /// Revoke any session by ID.
    ///
    /// # Errors
    ///
    /// Returns `Rpc` if the session service rejects the revocation.
    async fn revoke_session(&self, session_id: &SessionId) -> Result<()>;
}

/// The main authentication service.
pub struct AuthService<S: SessionStore, I: IdentityService> {
    tokens: Arc<TokenMaker>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    sessions: SessionCoordinator<S>,
    credentials: CredentialValidator<I>,
}

impl<S: SessionStore, I: IdentityService> AuthService<S, I> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        tokens: Arc<TokenMaker>,
        auth: &AuthConfig,
        sessions: Arc<S>,
        users: Arc<I>,
        config: &ControlConfig,
    ) -> Self {
        Self {
            tokens,
            access_ttl: auth.access_ttl(),
            refresh_ttl: auth.refresh_ttl(),
            sessions: SessionCoordinator::new(sessions, config.max_sessions_per_identity),
            credentials: CredentialValidator::new(users),
        }
    }

    /// The session coordinator.
    #[must_use]
    pub const fn sessions(&self) -> &SessionCoordinator<S> {
        &self.sessions
    }

    fn session_for(claims: &Claims, cookie_session: Option<SessionId>) -> (SessionId, bool) {
        match cookie_session {
            Some(id) => (id, true),
            None => (claims.session_id(), false),
        }
    }
}

#[async_trait]
impl<S, I> AuthControl for AuthService<S, I>
where
    S: SessionStore + 'static,
    I: IdentityService + 'static,
{
    // =========================================================================
    // Public Operations
    // =========================================================================

    async fn login(&self, request: LoginRequest) -> Result<LoginOutcome> {
        let email = request.email.trim();
        if email.is_empty() || request.password.trim().is_empty() {
            return Err(ControlError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let user = self.credentials.authenticate(email, &request.password).await?;

        match self.sessions.list_active_by_identity(&user.email).await {
            Ok(active) => {
                tracing::debug!(email = %user.email, active = active.len(), "Existing sessions");
            }
            Err(e) => {
                tracing::warn!(email = %user.email, error = %e, "Could not list existing sessions");
            }
        }

        let (access_token, access) = self.tokens.issue(
            TokenKind::Access,
            user.id,
            &user.email,
            user.is_admin,
            self.access_ttl,
        )?;
        let (refresh_token, refresh) = self.tokens.issue(
            TokenKind::Refresh,
            user.id,
            &user.email,
            user.is_admin,
            self.refresh_ttl,
        )?;

        let session = self
            .sessions
            .create(
                refresh.session_id(),
                &user.email,
                &refresh_token,
                refresh.expires_at(),
            )
            .await
            .map_err(|e| {
                tracing::error!(email = %user.email, error = %e, "Failed to create session");
                ControlError::Internal(format!("failed to create session: {e}"))
            })?;

        tracing::info!(
            email = %user.email,
            session_id = %session.id,
            "User logged in"
        );

        Ok(LoginOutcome {
            session_id: session.id,
            access_token,
            refresh_token,
            access_token_expires_at: access.expires_at(),
            refresh_token_expires_at: refresh.expires_at(),
            user: UserProfile::from(&user),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome> {
        if refresh_token.is_empty() {
            return Err(ControlError::Unauthenticated(
                "refresh token is required".to_string(),
            ));
        }

        let claims = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid refresh token");
                ControlError::Auth(e)
            })?;

        let session_id = claims.session_id();
        let session = self.sessions.get(&session_id).await.map_err(|e| {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to load session");
            ControlError::Rpc(e)
        })?;

        if session.is_revoked {
            tracing::warn!(session_id = %session_id, "Refresh on revoked session");
            return Err(ControlError::SessionRevoked);
        }

        if session.user_email != claims.email {
            tracing::warn!(
                session_id = %session_id,
                token_email = %claims.email,
                session_email = %session.user_email,
                "Session email mismatch"
            );
            return Err(ControlError::SessionMismatch);
        }

        let (access_token, access) = self.tokens.issue(
            TokenKind::Access,
            claims.id,
            &claims.email,
            claims.is_admin,
            self.access_ttl,
        )?;

        tracing::info!(email = %claims.email, "Access token refreshed");

        Ok(RefreshOutcome {
            access_token,
            access_token_expires_at: access.expires_at(),
        })
    }

    // =========================================================================
    // Authenticated Operations
    // =========================================================================

    async fn logout(&self, claims: &Claims, cookie_session: Option<SessionId>) {
        let (session_id, _) = Self::session_for(claims, cookie_session);

        if let Err(e) = self.sessions.delete(&session_id).await {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Failed to delete session on logout"
            );
        }

        tracing::info!(email = %claims.email, "User logged out");
    }

    async fn revoke(
        &self,
        claims: &Claims,
        cookie_session: Option<SessionId>,
    ) -> Result<SessionId> {
        let (session_id, from_cookie) = Self::session_for(claims, cookie_session);

        if from_cookie {
            let session = self.sessions.get(&session_id).await?;
            if session.user_email != claims.email {
                tracing::warn!(
                    session_id = %session_id,
                    email = %claims.email,
                    "Attempt to revoke another identity's session"
                );
                return Err(ControlError::Forbidden(
                    "session belongs to another user".to_string(),
                ));
            }
        }

        self.sessions.revoke(&session_id).await?;

        tracing::info!(email = %claims.email, session_id = %session_id, "Session revoked by owner");

        Ok(session_id)
    }

    async fn me(&self, claims: &Claims) -> Result<UserProfile> {
        let user = self.credentials.lookup_by_id(claims.id).await?;
        Ok(UserProfile::from(&user))
    }

    // =========================================================================
    // Admin Operations
    // =========================================================================

    async fn list_sessions(&self, email: &str) -> Result<Vec<SessionSummary>> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ControlError::Validation("email is required".to_string()));
        }

        let sessions = self.sessions.list_active_by_identity(email).await?;
        Ok(sessions.into_iter().map(SessionSummary::from).collect())
    }

    async fn revoke_session(&self, session_id: &SessionId) -> Result<()> {
        self.sessions.revoke(session_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_auth::{hash_password, AuthError};
    use gatehouse_core::UserId;
    use gatehouse_rpc::memory::{MemoryIdentityService, MemorySessionStore};
    use gatehouse_rpc::{RpcCode, RpcError, UserRecord};

    struct Fixture {
        service: AuthService<MemorySessionStore, MemoryIdentityService>,
        store: Arc<MemorySessionStore>,
        tokens: Arc<TokenMaker>,
    }

    fn setup() -> Fixture {
        let auth = AuthConfig::with_secret("flow-test-secret");
        let tokens = Arc::new(TokenMaker::new(&auth).unwrap());
        let store = Arc::new(MemorySessionStore::new());
        let users = Arc::new(MemoryIdentityService::new());

        let password = hash_password("hunter2").unwrap();
        users.insert(UserRecord {
            id: UserId::new(1),
            name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            password: password.clone(),
            is_admin: false,
        });
        users.insert(UserRecord {
            id: UserId::new(2),
            name: "Bob".to_string(),
            email: "bob@x.com".to_string(),
            password,
            is_admin: true,
        });

        let service = AuthService::new(
            Arc::clone(&tokens),
            &auth,
            Arc::clone(&store),
            users,
            &ControlConfig::default(),
        );

        Fixture {
            service,
            store,
            tokens,
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_issues_tokens_and_session() {
        let fx = setup();
        let outcome = fx
            .service
            .login(login_request(" ada@x.com ", "hunter2"))
            .await
            .unwrap();

        let access = fx
            .tokens
            .verify(&outcome.access_token, TokenKind::Access)
            .unwrap();
        let refresh = fx
            .tokens
            .verify(&outcome.refresh_token, TokenKind::Refresh)
            .unwrap();

        assert_eq!(access.email, "ada@x.com");
        assert_eq!(refresh.session_id(), outcome.session_id);
        assert_eq!(outcome.user.id, UserId::new(1));
        assert!(outcome.refresh_token_expires_at > outcome.access_token_expires_at);

        let stored = fx.store.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].refresh_token, outcome.refresh_token);
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let fx = setup();
        let err = fx
            .service
            .login(login_request("ada@x.com", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Validation(_)));
    }

    #[tokio::test]
    async fn fourth_login_evicts_oldest() {
        let fx = setup();
        let mut ids = Vec::new();
        for _ in 0..4 {
            let outcome = fx
                .service
                .login(login_request("ada@x.com", "hunter2"))
                .await
                .unwrap();
            ids.push(outcome.session_id);
        }

        let active: Vec<_> = fx
            .service
            .list_sessions("ada@x.com")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(active, ids[1..].to_vec());
    }

    #[tokio::test]
    async fn login_fails_internally_when_session_cannot_be_created() {
        let fx = setup();
        fx.store
            .fail("CreateSession", RpcError::unavailable("down"));
        let err = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Internal(_)));
    }

    #[tokio::test]
    async fn refresh_issues_new_access_token() {
        let fx = setup();
        let login = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap();

        let refreshed = fx.service.refresh(&login.refresh_token).await.unwrap();
        let claims = fx.tokens.verify(&refreshed.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.email, "ada@x.com");
        assert_ne!(refreshed.access_token, login.access_token);
    }

    #[tokio::test]
    async fn refresh_rejects_revoked_session() {
        let fx = setup();
        let login = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap();
        fx.service.revoke_session(&login.session_id).await.unwrap();

        let err = fx.service.refresh(&login.refresh_token).await.unwrap_err();
        assert!(matches!(err, ControlError::SessionRevoked));
    }

    #[tokio::test]
    async fn refresh_rejects_session_of_other_identity() {
        let fx = setup();
        let (token, claims) = fx
            .tokens
            .issue(TokenKind::Refresh, UserId::new(1), "ada@x.com", false, Duration::hours(1))
            .unwrap();
        fx.service
            .sessions()
            .create(
                claims.session_id(),
                "bob@x.com",
                &token,
                claims.expires_at(),
            )
            .await
            .unwrap();

        let err = fx.service.refresh(&token).await.unwrap_err();
        assert!(matches!(err, ControlError::SessionMismatch));
    }

    #[tokio::test]
    async fn refresh_with_unknown_session_is_not_found() {
        let fx = setup();
        let (token, _) = fx
            .tokens
            .issue(TokenKind::Refresh, UserId::new(1), "ada@x.com", false, Duration::hours(1))
            .unwrap();

        match fx.service.refresh(&token).await.unwrap_err() {
            ControlError::Rpc(e) => assert_eq!(e.code, RpcCode::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let fx = setup();
        let login = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap();

        let err = fx.service.refresh(&login.access_token).await.unwrap_err();
        assert!(matches!(err, ControlError::Auth(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn refresh_rejects_garbage() {
        let fx = setup();
        let err = fx.service.refresh("garbage").await.unwrap_err();
        assert!(matches!(err, ControlError::Auth(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn logout_deletes_cookie_session() {
        let fx = setup();
        let login = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap();
        let access = fx.tokens.verify(&login.access_token, TokenKind::Access).unwrap();

        fx.service.logout(&access, Some(login.session_id)).await;
        assert!(fx.store.is_empty());
    }

    #[tokio::test]
    async fn logout_tolerates_missing_session_and_outage() {
        let fx = setup();
        let (_, access) = fx
            .tokens
            .issue(TokenKind::Access, UserId::new(1), "ada@x.com", false, Duration::minutes(15))
            .unwrap();

        fx.service.logout(&access, None).await;

        fx.store
            .fail("DeleteSession", RpcError::unavailable("down"));
        fx.service.logout(&access, None).await;
    }

    #[tokio::test]
    async fn revoke_marks_own_session() {
        let fx = setup();
        let login = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap();
        let access = fx.tokens.verify(&login.access_token, TokenKind::Access).unwrap();

        let revoked = fx
            .service
            .revoke(&access, Some(login.session_id))
            .await
            .unwrap();
        assert_eq!(revoked, login.session_id);
        assert!(fx.store.all()[0].is_revoked);
    }

    #[tokio::test]
    async fn revoke_refuses_foreign_session() {
        let fx = setup();
        let ada = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap();
        let bob = fx
            .service
            .login(login_request("bob@x.com", "hunter2"))
            .await
            .unwrap();
        let bob_access = fx.tokens.verify(&bob.access_token, TokenKind::Access).unwrap();

        let err = fx
            .service
            .revoke(&bob_access, Some(ada.session_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Forbidden(_)));
    }

    #[tokio::test]
    async fn revoke_failure_surfaces() {
        let fx = setup();
        let (_, access) = fx
            .tokens
            .issue(TokenKind::Access, UserId::new(1), "ada@x.com", false, Duration::minutes(15))
            .unwrap();

        let err = fx.service.revoke(&access, None).await.unwrap_err();
        assert!(matches!(err, ControlError::Rpc(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn revoke_without_cookie_misses_live_session() {
        let fx = setup();
        let login = fx
            .service
            .login(login_request("ada@x.com", "hunter2"))
            .await
            .unwrap();
        let access = fx.tokens.verify(&login.access_token, TokenKind::Access).unwrap();

        let err = fx.service.revoke(&access, None).await.unwrap_err();
        assert!(matches!(err, ControlError::Rpc(ref e) if e.is_not_found()));
        assert!(!fx.store.all()[0].is_revoked);
    }

    #[tokio::test]
    async fn me_returns_profile() {
        let fx = setup();
        let (_, access) = fx
            .tokens
            .issue(TokenKind::Access, UserId::new(2), "bob@x.com", true, Duration::minutes(15))
            .unwrap();

        let profile = fx.service.me(&access).await.unwrap();
        assert_eq!(profile.name, "Bob");
        assert!(profile.is_admin);
    }

    #[tokio::test]
    async fn admin_listing_requires_email() {
        let fx = setup();
        let err = fx.service.list_sessions(" ").await.unwrap_err();
        assert!(matches!(err, ControlError::Validation(_)));
        assert!(fx.service.list_sessions("nobody@x.com").await.unwrap().is_empty());
    }
}
