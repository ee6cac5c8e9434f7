//! Request classification middleware and identity extractor.
//!
//! Protected routes pass through two stages:
//!
//! 1. **Authentication**: resolve a token from the `access_token` cookie or
//!    an `Authorization: Bearer` header, verify it, and store the [`Claims`]
//!    in the request extensions.
//! 2. **Authorization** (admin routes only): require `is_admin` on those
//!    claims.
//!
//! The stages are private. Routes opt in through [`require_auth`], which
//! always places authorization inside authentication.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum_extra::extract::cookie::CookieJar;

use gatehouse_auth::{Claims, TokenKind, TokenVerifier};
use gatehouse_control::AuthControl;

use crate::cookies;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Message for requests that carry no credential at all.
pub const MISSING_CREDENTIAL: &str = "Authorization required";
/// Message for a malformed `Authorization` header.
pub const MALFORMED_HEADER: &str = "Invalid authorization header format";
/// Message for a token that fails verification.
pub const INVALID_TOKEN: &str = "Invalid or expired token";
/// Message for a non-admin caller on an admin route.
pub const ADMIN_REQUIRED: &str = "Access denied: admin privileges required";

/// Access level required by a group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any caller with a valid access token.
    Authenticated,
    /// Callers whose token carries `is_admin`.
    Admin,
}

/// Where a request's access token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carrier {
    Cookie,
    Header,
}

/// Protect every route in `router` at the given access level.
///
/// The layers only apply to routes already added to `router`.
pub fn require_auth<C, V>(
    router: Router<Arc<GatewayState<C, V>>>,
    state: Arc<GatewayState<C, V>>,
    access: Access,
) -> Router<Arc<GatewayState<C, V>>>
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let router = match access {
        Access::Authenticated => router,
        Access::Admin => router.route_layer(middleware::from_fn(authorize_admin)),
    };

    // Added last, so it runs first.
    router.route_layer(middleware::from_fn_with_state(state, authenticate::<C, V>))
}

/// Pick the access token, preferring the cookie over the header.
fn resolve_token<'a>(
    jar: &'a CookieJar,
    headers: &'a HeaderMap,
) -> Result<(&'a str, Carrier), ApiError> {
    if let Some(token) = cookies::access_token(jar) {
        return Ok((token, Carrier::Cookie));
    }

    let Some(header) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::Unauthorized(MISSING_CREDENTIAL.to_string()));
    };

    let malformed = || ApiError::Unauthorized(MALFORMED_HEADER.to_string());
    let header = header.to_str().map_err(|_| malformed())?;

    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok((token, Carrier::Header))
        }
        _ => Err(malformed()),
    }
}

async fn authenticate<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response
where
    C: AuthControl + 'static,
    V: TokenVerifier + 'static,
{
    let (token, carrier) = match resolve_token(&jar, request.headers()) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::debug!(path = %request.uri().path(), error = %err, "Rejected request");
            return err.into_response();
        }
    };

    match state.verifier.verify(token, TokenKind::Access) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(
                path = %request.uri().path(),
                carrier = ?carrier,
                error = %e,
                "Token verification failed"
            );
            let err = ApiError::Unauthorized(INVALID_TOKEN.to_string());
            if carrier == Carrier::Cookie {
                (cookies::clear_all(jar, state.config.cookie_secure), err).into_response()
            } else {
                err.into_response()
            }
        }
    }
}

async fn authorize_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(claims) = request.extensions().get::<Claims>() else {
        tracing::error!(
            path = %request.uri().path(),
            "Admin check ran without authenticated claims"
        );
        return Err(ApiError::Internal("missing claims in admin stage".to_string()));
    };

    if !claims.is_admin {
        tracing::warn!(email = %claims.email, "Non-admin caller on admin route");
        return Err(ApiError::Forbidden(ADMIN_REQUIRED.to_string()));
    }

    Ok(next.run(request).await)
}

/// The verified claims of the current caller.
///
/// Only usable on routes protected by [`require_auth`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<Claims>()
                .cloned()
                .map(Authenticated)
                .ok_or_else(|| {
                    tracing::error!(
                        path = %parts.uri.path(),
                        "Handler expected claims on an unprotected route"
                    );
                    ApiError::Internal("missing authenticated claims".to_string())
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn message(result: Result<(&str, Carrier), ApiError>) -> String {
        result.unwrap_err().translate().1
    }

    #[test]
    fn cookie_wins_over_header() {
        let jar = CookieJar::new().add(Cookie::new("access_token", "from-cookie"));
        let headers = headers("Bearer from-header");
        assert_eq!(
            resolve_token(&jar, &headers).unwrap(),
            ("from-cookie", Carrier::Cookie)
        );
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let jar = CookieJar::new();
        for value in ["Bearer abc", "bearer abc", "BEARER abc"] {
            let headers = headers(value);
            assert_eq!(
                resolve_token(&jar, &headers).unwrap(),
                ("abc", Carrier::Header)
            );
        }
    }

    #[test]
    fn missing_credential() {
        let jar = CookieJar::new();
        let headers = HeaderMap::new();
        assert_eq!(message(resolve_token(&jar, &headers)), MISSING_CREDENTIAL);
    }

    #[test]
    fn malformed_headers() {
        let jar = CookieJar::new();
        for value in ["Bearer", "Basic abc", "Bearer a b", "Bearer  abc", "abc"] {
            let headers = headers(value);
            assert_eq!(
                message(resolve_token(&jar, &headers)),
                MALFORMED_HEADER,
                "{value}"
            );
        }
    }
}
