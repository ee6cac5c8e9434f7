//! Authentication flows and session coordination for gatehouse.
//!
//! This crate holds the business logic of the authentication core. It
//! coordinates the token engine from `gatehouse-auth` with the remote session
//! and user services from `gatehouse-rpc`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway (HTTP)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AuthService                            │
//! │  ┌─────────────┐ ┌─────────────────┐ ┌─────────────────┐    │
//! │  │   Token     │ │    Session      │ │   Credential    │    │
//! │  │   Maker     │ │    Coordinator  │ │   Validator     │    │
//! │  └─────────────┘ └─────────────────┘ └─────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                   ┌──────────┴──────────┐
//!                   ▼                     ▼
//!            ┌──────────────┐      ┌──────────────┐
//!            │ SessionStore │      │  Identity    │
//!            │   (remote)   │      │  (remote)    │
//!            └──────────────┘      └──────────────┘
//! ```
//!
//! # Session cap
//!
//! Each identity may hold at most [`ControlConfig::max_sessions_per_identity`]
//! non-revoked sessions. A login that pushes an identity over the cap evicts
//! its oldest active session. Eviction is best effort: if the delete fails,
//! the new session stands and the cap is briefly exceeded.
//!
//! # Logout and revoke
//!
//! Logout deletes the session and never fails. Revoke flags the session and
//! reports every failure. The two are kept as separate operations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credentials;
pub mod error;
pub mod flow;
pub mod session;
pub mod types;

pub use credentials::CredentialValidator;
pub use error::{ControlError, Result};
pub use flow::{AuthControl, AuthService};
pub use session::SessionCoordinator;
pub use types::{
    ControlConfig, LoginOutcome, LoginRequest, RefreshOutcome, SessionSummary, UserProfile,
};

// Re-export commonly used types from dependencies for convenience
pub use gatehouse_auth::Claims;
pub use gatehouse_core::{SessionId, UserId};
pub use gatehouse_rpc::{Session, UserRecord};
