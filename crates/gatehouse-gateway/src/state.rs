//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use gatehouse_auth::TokenVerifier;
use gatehouse_control::AuthControl;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// Built once at startup and never mutated.
pub struct GatewayState<C, V>
where
    C: AuthControl,
    V: TokenVerifier,
{
    /// The authentication flows.
    pub control: Arc<C>,
    /// Verifies access tokens on inbound requests.
    pub verifier: Arc<V>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<C, V> GatewayState<C, V>
where
    C: AuthControl,
    V: TokenVerifier,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(control: Arc<C>, verifier: Arc<V>, config: GatewayConfig) -> Self {
        Self {
            control,
            verifier,
            config,
        }
    }
}

impl<C, V> Clone for GatewayState<C, V>
where
    C: AuthControl,
    V: TokenVerifier,
{
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            verifier: Arc::clone(&self.verifier),
            config: self.config.clone(),
        }
    }
}
