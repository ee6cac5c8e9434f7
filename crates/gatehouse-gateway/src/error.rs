//! API error types and responses.
//!
//! Every failure that reaches a client passes through [`ApiError::translate`],
//! the single place where error status codes are decided. Error bodies have
//! the form `{"error": "<message>"}`; 500 responses never carry internal text.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use gatehouse_auth::AuthError;
use gatehouse_control::ControlError;
use gatehouse_rpc::{RpcCode, RpcError};

/// Message returned for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Message for a body over the configured size limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "request body too large";

/// Message for a request that ran past the configured timeout.
pub const TIMEOUT_MESSAGE: &str = "request timed out";

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid or rejected credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller lacks the privileges for this operation.
    #[error("{0}")]
    Forbidden(String),

    /// A backend service returned an error status.
    #[error("backend error: {0}")]
    Backend(RpcError),

    /// An untyped local error, classified by its text.
    ///
    /// Validation messages and extractor rejections arrive here.
    #[error("{0}")]
    Text(String),

    /// The request body exceeded the size limit.
    #[error("request body too large")]
    PayloadTooLarge,

    /// The request did not complete within the timeout.
    #[error("request timed out")]
    RequestTimeout,

    /// Internal server error. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    /// Decide the status code and client-facing message for this error.
    #[must_use]
    pub fn translate(&self) -> (StatusCode, String) {
        match self {
            Self::Backend(err) => translate_backend(err),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::Text(msg) => translate_text(msg),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                PAYLOAD_TOO_LARGE_MESSAGE.to_string(),
            ),
            Self::RequestTimeout => (StatusCode::REQUEST_TIMEOUT, TIMEOUT_MESSAGE.to_string()),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                internal()
            }
        }
    }

    /// The HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.translate().0
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR_MESSAGE.to_string(),
    )
}

fn translate_backend(err: &RpcError) -> (StatusCode, String) {
    let status = match err.code {
        RpcCode::NotFound => StatusCode::NOT_FOUND,
        RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
        RpcCode::AlreadyExists => StatusCode::CONFLICT,
        RpcCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        RpcCode::PermissionDenied => StatusCode::FORBIDDEN,
        _ => {
            tracing::error!(code = %err.code, message = %err.message, "Unhandled backend error");
            return internal();
        }
    };
    (status, err.message.clone())
}

fn translate_text(msg: &str) -> (StatusCode, String) {
    let lower = msg.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if contains_any(&["required", "invalid", "format", "positive integer"]) {
        (StatusCode::BAD_REQUEST, msg.to_string())
    } else if contains_any(&["unauthorized", "unauthenticated"]) {
        (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
    } else if lower.contains("not found") {
        (StatusCode::NOT_FOUND, msg.to_string())
    } else {
        tracing::error!(error = %msg, "Unclassified error");
        internal()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.translate();
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::InvalidSignature | AuthError::InvalidToken(_) => {
                Self::Unauthorized("Invalid or expired token".to_string())
            }
            AuthError::MissingSigningKey | AuthError::Internal(_) => {
                Self::Internal(format!("auth: {err}"))
            }
        }
    }
}

impl From<RpcError> for ApiError {
    fn from(err: RpcError) -> Self {
        Self::Backend(err)
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Validation(msg) => Self::Text(msg),
            ControlError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            ControlError::Unauthenticated(msg) => Self::Unauthorized(msg),
            ControlError::SessionRevoked | ControlError::SessionMismatch => {
                Self::Unauthorized(err.to_string())
            }
            ControlError::Forbidden(msg) => Self::Forbidden(msg),
            ControlError::Auth(auth_err) => Self::from(auth_err),
            ControlError::Rpc(rpc_err) => Self::Backend(rpc_err),
            ControlError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // A streamed body over the limit surfaces here rather than in the layer.
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::Text(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Text(format!("invalid query: {}", rejection.body_text()))
    }
}

/// Re-issue plain-text transport failures as translated errors.
///
/// The timeout and body-limit layers answer on their own with non-JSON
/// bodies; this maps them onto [`ApiError`] so every error has one shape.
pub async fn normalize_transport_errors(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }

    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge.into_response(),
        StatusCode::REQUEST_TIMEOUT => ApiError::RequestTimeout.into_response(),
        _ => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_codes() {
        let cases = [
            (RpcCode::NotFound, StatusCode::NOT_FOUND),
            (RpcCode::InvalidArgument, StatusCode::BAD_REQUEST),
            (RpcCode::AlreadyExists, StatusCode::CONFLICT),
            (RpcCode::Unauthenticated, StatusCode::UNAUTHORIZED),
            (RpcCode::PermissionDenied, StatusCode::FORBIDDEN),
            (RpcCode::Unavailable, StatusCode::INTERNAL_SERVER_ERROR),
            (RpcCode::Unknown, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let err = ApiError::from(RpcError::new(code, "detail"));
            assert_eq!(err.status_code(), status, "{code}");
        }
    }

    #[test]
    fn backend_500_is_redacted() {
        let (_, message) = ApiError::from(RpcError::internal("db password wrong")).translate();
        assert_eq!(message, INTERNAL_ERROR_MESSAGE);

        let (_, message) = ApiError::from(RpcError::not_found("session not found")).translate();
        assert_eq!(message, "session not found");
    }

    #[test]
    fn text_classification() {
        let classify = |msg: &str| ApiError::Text(msg.to_string()).translate();

        assert_eq!(classify("email is required").0, StatusCode::BAD_REQUEST);
        assert_eq!(classify("Invalid ID").0, StatusCode::BAD_REQUEST);
        assert_eq!(classify("bad date format").0, StatusCode::BAD_REQUEST);
        assert_eq!(
            classify("id must be a positive integer").0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            classify("unauthenticated caller"),
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        );
        assert_eq!(classify("event not found").0, StatusCode::NOT_FOUND);
        assert_eq!(
            classify("disk on fire"),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string()
            )
        );
    }

    #[test]
    fn internal_detail_never_leaks() {
        let (status, message) = ApiError::Internal("stack trace".into()).translate();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn control_errors() {
        assert_eq!(
            ApiError::from(ControlError::InvalidCredentials).translate(),
            (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
        );
        assert_eq!(
            ApiError::from(ControlError::Validation("email and password are required".into()))
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ControlError::SessionRevoked).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(ControlError::Forbidden("no".into())).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(ControlError::Auth(AuthError::TokenExpired)).translate(),
            (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string()
            )
        );
        assert_eq!(
            ApiError::from(ControlError::Auth(AuthError::Internal("sign".into()))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_and_rejections_use_text_classifier() {
        let err = ApiError::from(ControlError::Validation("email is required".into()));
        assert!(matches!(err, ApiError::Text(_)));
        assert_eq!(
            err.translate(),
            (StatusCode::BAD_REQUEST, "email is required".to_string())
        );
    }

    #[test]
    fn transport_errors_translate() {
        assert_eq!(
            ApiError::PayloadTooLarge.translate(),
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                PAYLOAD_TOO_LARGE_MESSAGE.to_string()
            )
        );
        assert_eq!(
            ApiError::RequestTimeout.status_code(),
            StatusCode::REQUEST_TIMEOUT
        );
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn plain_transport_responses_are_normalized() {
        let timeout = StatusCode::REQUEST_TIMEOUT.into_response();
        let response = normalize_transport_errors(timeout).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body_json(response).await["error"], TIMEOUT_MESSAGE);

        let too_large = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let response = normalize_transport_errors(too_large).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["error"], PAYLOAD_TOO_LARGE_MESSAGE);
    }

    #[tokio::test]
    async fn json_and_success_responses_pass_through() {
        let translated = ApiError::Unauthorized("nope".into()).into_response();
        let response = normalize_transport_errors(translated).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "nope");

        let ok = normalize_transport_errors(StatusCode::NO_CONTENT.into_response()).await;
        assert_eq!(ok.status(), StatusCode::NO_CONTENT);
    }
}
