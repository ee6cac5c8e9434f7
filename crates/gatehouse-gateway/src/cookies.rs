//! Credential cookies.
//!
//! Three HTTP-only cookies carry credentials between requests:
//! `access_token`, `refresh_token` and `session_id`. All use `SameSite=Lax`
//! and `Path=/`; `Secure` follows configuration.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::{Duration, OffsetDateTime};

use gatehouse_control::LoginOutcome;
use gatehouse_core::SessionId;

/// Access token cookie name.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Refresh token cookie name.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// Session ID cookie name.
pub const SESSION_ID_COOKIE: &str = "session_id";

const ALL_COOKIES: [&str; 3] = [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, SESSION_ID_COOKIE];

fn max_age_until(expires_at: DateTime<Utc>) -> Duration {
    let seconds = (expires_at - Utc::now()).num_seconds().max(0);
    Duration::seconds(seconds)
}

fn credential_cookie(
    name: &'static str,
    value: String,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age_until(expires_at))
        .build()
}

fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Set all three credential cookies after a login.
#[must_use]
pub fn set_login(jar: CookieJar, outcome: &LoginOutcome, secure: bool) -> CookieJar {
    jar.add(credential_cookie(
        ACCESS_TOKEN_COOKIE,
        outcome.access_token.clone(),
        outcome.access_token_expires_at,
        secure,
    ))
    .add(credential_cookie(
        REFRESH_TOKEN_COOKIE,
        outcome.refresh_token.clone(),
        outcome.refresh_token_expires_at,
        secure,
    ))
    .add(credential_cookie(
        SESSION_ID_COOKIE,
        outcome.session_id.to_string(),
        outcome.refresh_token_expires_at,
        secure,
    ))
}

/// Replace the access token cookie.
#[must_use]
pub fn set_access(
    jar: CookieJar,
    token: String,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> CookieJar {
    jar.add(credential_cookie(ACCESS_TOKEN_COOKIE, token, expires_at, secure))
}

/// Expire all three credential cookies.
///
/// `secure` must match the flag the cookies were set with, or browsers may
/// keep the originals.
#[must_use]
pub fn clear_all(jar: CookieJar, secure: bool) -> CookieJar {
    ALL_COOKIES
        .into_iter()
        .fold(jar, |jar, name| jar.add(expired_cookie(name, secure)))
}

fn value<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(Cookie::value).filter(|v| !v.is_empty())
}

/// The access token carried by cookie, if any.
#[must_use]
pub fn access_token(jar: &CookieJar) -> Option<&str> {
    value(jar, ACCESS_TOKEN_COOKIE)
}

/// The refresh token carried by cookie, if any.
#[must_use]
pub fn refresh_token(jar: &CookieJar) -> Option<&str> {
    value(jar, REFRESH_TOKEN_COOKIE)
}

/// The session ID carried by cookie, if present and well formed.
#[must_use]
pub fn session_id(jar: &CookieJar) -> Option<SessionId> {
    let raw = value(jar, SESSION_ID_COOKIE)?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::debug!("Ignoring malformed session_id cookie");
            None
        }
    }
}
