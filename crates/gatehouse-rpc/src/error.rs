//! Error types for remote calls.
//!
//! Remote services report failures with canonical RPC status codes. Transport
//! problems are folded into the same taxonomy so callers only ever see an
//! [`RpcError`].

use std::fmt;

use thiserror::Error;

/// A result type using `RpcError`.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Canonical RPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcCode {
    /// The call was cancelled by the caller.
    Cancelled,
    /// Unknown error, or a code this client does not recognise.
    Unknown,
    /// The request was malformed.
    InvalidArgument,
    /// The call did not complete before its deadline.
    DeadlineExceeded,
    /// The requested entity does not exist.
    NotFound,
    /// The entity being created already exists.
    AlreadyExists,
    /// The caller is not allowed to perform the operation.
    PermissionDenied,
    /// A quota or rate limit was exhausted.
    ResourceExhausted,
    /// The system is not in a state required for the operation.
    FailedPrecondition,
    /// The operation was aborted, typically on a concurrency conflict.
    Aborted,
    /// The operation is not implemented by the remote service.
    Unimplemented,
    /// The remote service hit an internal error.
    Internal,
    /// The remote service could not be reached.
    Unavailable,
    /// The caller's credentials were rejected.
    Unauthenticated,
}

impl RpcCode {
    /// Parse a canonical code name such as `NOT_FOUND`.
    ///
    /// Unrecognised names map to [`RpcCode::Unknown`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "CANCELLED" => Self::Cancelled,
            "INVALID_ARGUMENT" => Self::InvalidArgument,
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded,
            "NOT_FOUND" => Self::NotFound,
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted,
            "FAILED_PRECONDITION" => Self::FailedPrecondition,
            "ABORTED" => Self::Aborted,
            "UNIMPLEMENTED" => Self::Unimplemented,
            "INTERNAL" => Self::Internal,
            "UNAVAILABLE" => Self::Unavailable,
            "UNAUTHENTICATED" => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }

    /// The canonical name of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed remote call: a status code plus the service's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    /// Canonical status code.
    pub code: RpcCode,
    /// Message reported by the remote service (or the transport).
    pub message: String,
}

impl RpcError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for a `NOT_FOUND` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcCode::NotFound, message)
    }

    /// Shorthand for an `UNAVAILABLE` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unavailable, message)
    }

    /// Shorthand for an `INTERNAL` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Internal, message)
    }

    /// Returns `true` for `NOT_FOUND`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == RpcCode::NotFound
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(RpcCode::DeadlineExceeded, "deadline exceeded")
        } else if err.is_decode() {
            Self::internal(format!("invalid response: {err}"))
        } else {
            Self::unavailable(format!("request failed: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_names_roundtrip() {
        for code in [
            RpcCode::NotFound,
            RpcCode::InvalidArgument,
            RpcCode::AlreadyExists,
            RpcCode::Unauthenticated,
            RpcCode::PermissionDenied,
            RpcCode::Unavailable,
        ] {
            assert_eq!(RpcCode::from_name(code.as_str()), code);
        }
    }

    #[test]
    fn unknown_code_name() {
        assert_eq!(RpcCode::from_name("TEAPOT"), RpcCode::Unknown);
        assert_eq!(RpcCode::from_name("not_found"), RpcCode::NotFound);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = RpcError::not_found("session abc");
        assert_eq!(err.to_string(), "NOT_FOUND: session abc");
        assert!(err.is_not_found());
    }
}
