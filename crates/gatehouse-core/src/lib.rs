//! Core types for gatehouse.
//!
//! This crate provides the strongly-typed identifiers shared by every layer of
//! the gateway:
//!
//! - [`UserId`]: numeric identifier assigned by the user service
//! - [`TokenId`]: unique identifier (`jti`) embedded in every signed token
//! - [`SessionId`]: identifier of a server-side session, equal to the `jti`
//!   of the refresh token it was created for
//!
//! # Example
//!
//! ```
//! use gatehouse_core::{SessionId, TokenId, UserId};
//!
//! let user_id = UserId::new(42);
//! let token_id = TokenId::generate();
//!
//! // A session is keyed by its refresh token's identifier.
//! let session_id = SessionId::from(token_id);
//! assert_eq!(session_id.to_string(), token_id.to_string());
//! assert_eq!(user_id.get(), 42);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{IdError, SessionId, TokenId, UserId};
