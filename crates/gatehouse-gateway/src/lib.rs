//! HTTP edge gateway for gatehouse.
//!
//! This crate provides the browser-facing API of the authentication core.
//! It handles:
//!
//! - Login, refresh, logout and revoke over JSON
//! - Credential transport in HTTP-only cookies or `Authorization: Bearer`
//! - Per-request authentication and admin authorization
//! - Translation of backend and local errors into uniform responses
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients                              │
//! │                  (cookies / Bearer)                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   gatehouse-gateway                         │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Classifier │ │   Router    │ │  Error              │    │
//! │  │  Middleware │ │  + Handlers │ │  Translator         │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐              ┌──────────────┐
//!        │ AuthControl  │              │ TokenVerifier│
//!        │ (flows)      │              │ (HS256)      │
//!        └──────────────┘              └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gatehouse_auth::TokenMaker;
//! use gatehouse_control::AuthService;
//! use gatehouse_gateway::{create_router, GatewayConfig, GatewayState};
//! use gatehouse_rpc::{HttpIdentityService, HttpSessionStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env()?;
//! let auth = config.auth_config();
//! let tokens = Arc::new(TokenMaker::new(&auth)?);
//!
//! let sessions = Arc::new(HttpSessionStore::new(
//!     config.session_service_url.clone(),
//!     config.call_timeouts(),
//! ));
//! let users = Arc::new(HttpIdentityService::new(
//!     config.user_service_url.clone(),
//!     config.call_timeouts(),
//! ));
//! let control = Arc::new(AuthService::new(
//!     Arc::clone(&tokens),
//!     &auth,
//!     sessions,
//!     users,
//!     &config.control_config(),
//! ));
//!
//! let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
//! let app = create_router(GatewayState::new(control, tokens, config));
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatewayConfig, ServiceEnv};
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;

// Re-export key types for convenience
pub use auth::{require_auth, Access, Authenticated};
