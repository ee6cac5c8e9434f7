//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use gatehouse_auth::TokenVerifier;
use gatehouse_control::AuthControl;

use crate::auth::{require_auth, Access};
use crate::error::normalize_transport_errors;
use crate::handlers::auth;
use crate::state::GatewayState;

/// Prefix for every gateway route.
pub const API_PREFIX: &str = "/api/v1/auth";

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// All routes are nested under `/api/v1/auth`.
///
/// ## Public
/// - `POST /login` - Log in, set credential cookies
/// - `POST /refresh` - New access token from a refresh token
///
/// ## Authenticated
/// - `POST /logout` - Delete the current session
/// - `POST /revoke` - Revoke the current session
/// - `GET /me` - Current user profile
///
/// ## Admin
/// - `GET /admin/sessions?email=` - List an identity's sessions
/// - `POST /admin/sessions/:session_id/revoke` - Revoke any session
pub fn create_router<C, V>(state: GatewayState<C, V>) -> Router
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let cors = build_cors_layer(&cors_origins);
    let state = Arc::new(state);

    let public = Router::new()
        .route("/login", post(auth::login::<C, V>))
        .route("/refresh", post(auth::refresh::<C, V>));

    let authenticated = require_auth(
        Router::new()
            .route("/logout", post(auth::logout::<C, V>))
            .route("/revoke", post(auth::revoke::<C, V>))
            .route("/me", get(auth::me::<C, V>)),
        Arc::clone(&state),
        Access::Authenticated,
    );

    let admin = require_auth(
        Router::new()
            .route(
                "/admin/sessions",
                get(auth::admin_list_sessions::<C, V>),
            )
            .route(
                "/admin/sessions/:session_id/revoke",
                post(auth::admin_revoke_session::<C, V>),
            ),
        Arc::clone(&state),
        Access::Admin,
    );

    let api = public.merge(authenticated).merge(admin);

    Router::new()
        .nest(API_PREFIX, api)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(normalize_transport_errors))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// Credentialed requests cannot use a wildcard origin, so credentials are
/// only allowed for an explicit origin list.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
            .allow_credentials(true)
    }
}
