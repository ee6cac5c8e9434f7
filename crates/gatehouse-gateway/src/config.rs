//! Gateway configuration types.
//!
//! Configuration is read from the environment at startup. Every field has a
//! default except the signing secret.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use gatehouse_auth::AuthConfig;
use gatehouse_control::ControlConfig;
use gatehouse_rpc::CallTimeouts;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A variable is set to a value that cannot be used.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceEnv {
    /// Local development.
    #[default]
    Dev,
    /// Production.
    Prod,
    /// Automated tests.
    Test,
}

impl FromStr for ServiceEnv {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            "test" => Ok(Self::Test),
            _ => Err(()),
        }
    }
}

/// Configuration for the gateway service.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    pub listen_addr: String,

    /// Deployment environment.
    pub environment: ServiceEnv,

    /// HMAC secret used to sign and verify tokens.
    pub secret_key: String,

    /// Base URL of the remote session service.
    pub session_service_url: String,

    /// Base URL of the remote user service.
    pub user_service_url: String,

    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,

    /// Whether credential cookies carry the `Secure` attribute.
    pub cookie_secure: bool,

    /// Access token lifetime in seconds.
    pub access_token_ttl_seconds: i64,

    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_seconds: i64,

    /// Maximum non-revoked sessions per identity.
    pub max_sessions_per_identity: usize,

    /// Grace period for draining requests on shutdown, in seconds.
    pub shutdown_grace_seconds: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_session_service_url() -> String {
        "http://127.0.0.1:9001".to_string()
    }

    fn default_user_service_url() -> String {
        "http://127.0.0.1:9002".to_string()
    }

    const fn default_access_ttl() -> i64 {
        15 * 60
    }

    const fn default_refresh_ttl() -> i64 {
        24 * 60 * 60
    }

    const fn default_max_sessions() -> usize {
        3
    }

    const fn default_shutdown_grace() -> u64 {
        10
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `Missing` if `SECRET_KEY` is unset and `Invalid` for values
    /// that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.secret_key = get("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;

        if let Some(addr) = get("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(env) = get("SERVICE_ENV") {
            config.environment = env
                .parse()
                .map_err(|()| ConfigError::Invalid { key: "SERVICE_ENV", value: env })?;
        }
        if let Some(url) = get("SESSION_SERVICE_URL") {
            config.session_service_url = url;
        }
        if let Some(url) = get("USER_SERVICE_URL") {
            config.user_service_url = url;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        config.cookie_secure = match get("COOKIE_SECURE") {
            Some(v) => parse_var("COOKIE_SECURE", &v)?,
            None => config.environment == ServiceEnv::Prod,
        };

        if let Some(v) = get("ACCESS_TOKEN_TTL_SECONDS") {
            config.access_token_ttl_seconds = parse_positive("ACCESS_TOKEN_TTL_SECONDS", &v)?;
        }
        if let Some(v) = get("REFRESH_TOKEN_TTL_SECONDS") {
            config.refresh_token_ttl_seconds = parse_positive("REFRESH_TOKEN_TTL_SECONDS", &v)?;
        }
        if let Some(v) = get("MAX_SESSIONS_PER_IDENTITY") {
            config.max_sessions_per_identity = parse_var("MAX_SESSIONS_PER_IDENTITY", &v)?;
            if config.max_sessions_per_identity == 0 {
                return Err(ConfigError::Invalid {
                    key: "MAX_SESSIONS_PER_IDENTITY",
                    value: v,
                });
            }
        }
        if let Some(v) = get("SHUTDOWN_GRACE_SECONDS") {
            config.shutdown_grace_seconds = parse_var("SHUTDOWN_GRACE_SECONDS", &v)?;
        }

        Ok(config)
    }

    /// Token settings derived from this configuration.
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            secret_key: self.secret_key.clone(),
            access_ttl_seconds: self.access_token_ttl_seconds,
            refresh_ttl_seconds: self.refresh_token_ttl_seconds,
        }
    }

    /// Session settings derived from this configuration.
    #[must_use]
    pub fn control_config(&self) -> ControlConfig {
        ControlConfig {
            max_sessions_per_identity: self.max_sessions_per_identity,
        }
    }

    /// Deadlines for calls to the remote services.
    #[must_use]
    pub fn call_timeouts(&self) -> CallTimeouts {
        CallTimeouts::default()
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the shutdown grace period as a `Duration`.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_positive(key: &'static str, value: &str) -> Result<i64, ConfigError> {
    let parsed: i64 = parse_var(key, value)?;
    if parsed <= 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            environment: ServiceEnv::default(),
            secret_key: String::new(),
            session_service_url: Self::default_session_service_url(),
            user_service_url: Self::default_user_service_url(),
            cors_origins: vec!["*".to_string()],
            cookie_secure: false,
            access_token_ttl_seconds: Self::default_access_ttl(),
            refresh_token_ttl_seconds: Self::default_refresh_ttl(),
            max_sessions_per_identity: Self::default_max_sessions(),
            shutdown_grace_seconds: Self::default_shutdown_grace(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("environment", &self.environment)
            .field("secret_key", &"<redacted>")
            .field("session_service_url", &self.session_service_url)
            .field("user_service_url", &self.user_service_url)
            .field("cors_origins", &self.cors_origins)
            .field("cookie_secure", &self.cookie_secure)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("max_sessions_per_identity", &self.max_sessions_per_identity)
            .field("shutdown_grace_seconds", &self.shutdown_grace_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}
