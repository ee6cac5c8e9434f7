//! Authentication endpoints.
//!
//! This module provides the login, refresh, logout and revoke handlers plus
//! the admin session endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_auth::TokenVerifier;
use gatehouse_control::{AuthControl, LoginRequest, SessionSummary, UserProfile};
use gatehouse_core::SessionId;

use crate::auth::Authenticated;
use crate::cookies;
use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The session opened by this login.
    pub session_id: SessionId,
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_token_expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: UserProfile,
}

/// Optional refresh request body, for clients that do not use cookies.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    #[serde(default)]
    pub refresh_token: String,
}

/// Response for a successful refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Newly signed access token.
    pub access_token: String,
    /// Access token expiry.
    pub access_token_expires_at: DateTime<Utc>,
}

/// Query for the admin session listing.
#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    /// Identity whose sessions to list.
    #[serde(default)]
    pub email: String,
}

/// Response for the admin session listing.
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    /// Active sessions, oldest first.
    pub sessions: Vec<SessionSummary>,
}

// =============================================================================
// Public Handlers
// =============================================================================

/// Log in with email and password.
///
/// Sets the `access_token`, `refresh_token` and `session_id` cookies and
/// returns the same tokens in the body.
///
/// # Errors
///
/// Returns 400 for blank fields, 401 with `invalid credentials` for an
/// unknown user or wrong password, and 500 if the session cannot be created.
pub async fn login<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let Json(request) = payload?;
    let outcome = state.control.login(request).await?;

    let jar = cookies::set_login(jar, &outcome, state.config.cookie_secure);
    let response = LoginResponse {
        session_id: outcome.session_id,
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        access_token_expires_at: outcome.access_token_expires_at,
        user: outcome.user,
    };

    Ok((jar, Json(response)))
}

/// Exchange a refresh token for a new access token.
///
/// The token is read from the `refresh_token` cookie, else from the JSON
/// body. Any failure clears all credential cookies.
///
/// # Errors
///
/// Returns 401 for an invalid token, a revoked session or an identity
/// mismatch, and 404 if the session no longer exists.
pub async fn refresh<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    jar: CookieJar,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (CookieJar, ApiError)>
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let token = match cookies::refresh_token(&jar) {
        Some(token) => token.to_string(),
        None => payload
            .map(|Json(body)| body.refresh_token)
            .unwrap_or_default(),
    };

    match state.control.refresh(&token).await {
        Ok(outcome) => {
            let jar = cookies::set_access(
                jar,
                outcome.access_token.clone(),
                outcome.access_token_expires_at,
                state.config.cookie_secure,
            );
            let response = RefreshResponse {
                access_token: outcome.access_token,
                access_token_expires_at: outcome.access_token_expires_at,
            };
            Ok((jar, Json(response)))
        }
        Err(err) => Err((
            cookies::clear_all(jar, state.config.cookie_secure),
            ApiError::from(err),
        )),
    }
}

// =============================================================================
// Authenticated Handlers
// =============================================================================

/// End the caller's session.
///
/// Always answers 204 and clears all credential cookies, even when the
/// session service cannot delete the session.
pub async fn logout<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    Authenticated(claims): Authenticated,
    jar: CookieJar,
) -> impl IntoResponse
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let session = cookies::session_id(&jar);
    state.control.logout(&claims, session).await;

    (
        cookies::clear_all(jar, state.config.cookie_secure),
        StatusCode::NO_CONTENT,
    )
}

/// Revoke the caller's session.
///
/// On success answers 204 and clears all credential cookies.
///
/// # Errors
///
/// Returns 403 if the `session_id` cookie names another user's session, and
/// the translated backend error if revocation fails.
pub async fn revoke<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    Authenticated(claims): Authenticated,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError>
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let session = cookies::session_id(&jar);
    state.control.revoke(&claims, session).await?;

    Ok((
        cookies::clear_all(jar, state.config.cookie_secure),
        StatusCode::NO_CONTENT,
    ))
}

/// The caller's profile.
///
/// # Errors
///
/// Returns 404 if the user no longer exists.
pub async fn me<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    Authenticated(claims): Authenticated,
) -> Result<Json<UserProfile>, ApiError>
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let profile = state.control.me(&claims).await?;
    Ok(Json(profile))
}

// =============================================================================
// Admin Handlers
// =============================================================================

/// List the active sessions of an identity.
///
/// # Errors
///
/// Returns 400 if `email` is missing.
pub async fn admin_list_sessions<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    Authenticated(admin): Authenticated,
    query: Result<Query<SessionsQuery>, QueryRejection>,
) -> Result<Json<ListSessionsResponse>, ApiError>
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let Query(query) = query?;
    let sessions = state.control.list_sessions(&query.email).await?;

    tracing::debug!(
        admin = %admin.email,
        email = %query.email,
        count = sessions.len(),
        "Listed sessions"
    );

    Ok(Json(ListSessionsResponse { sessions }))
}

/// Revoke any session.
///
/// # Errors
///
/// Returns 400 for a malformed session ID and 404 if the session does not
/// exist.
pub async fn admin_revoke_session<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    Authenticated(admin): Authenticated,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let session_id: SessionId = session_id
        .parse()
        .map_err(|_| ApiError::Text("invalid session ID format".to_string()))?;

    state.control.revoke_session(&session_id).await?;

    tracing::info!(admin = %admin.email, session_id = %session_id, "Admin revoked session");

    Ok(StatusCode::NO_CONTENT)
}
