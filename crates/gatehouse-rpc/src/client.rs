//! JSON-over-HTTP transport for unary remote calls.
//!
//! Every method is a `POST` to `{base_url}/{Service}/{Method}` with a JSON
//! request body. A 2xx response carries the JSON reply; anything else carries
//! `{"code": "<CANONICAL_CODE>", "message": "..."}`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RpcCode, RpcError};

/// Per-call deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    /// Deadline for ordinary unary calls.
    pub default: Duration,
    /// Deadline for long-running calls such as listings.
    pub bulk: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(5),
            bulk: Duration::from_secs(30),
        }
    }
}

/// Which deadline a call runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Ordinary unary call.
    Unary,
    /// Long-running call.
    Bulk,
}

/// Error body returned by a remote service.
#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// A client bound to one remote service.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
    service: &'static str,
    timeouts: CallTimeouts,
}

impl RpcClient {
    /// Create a client for `service` hosted at `base_url`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(base_url: impl Into<String>, service: &'static str, timeouts: CallTimeouts) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self::with_client(http, base_url, service, timeouts)
    }

    fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        service: &'static str,
        timeouts: CallTimeouts,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service,
            timeouts,
        }
    }

    /// Invoke `method` and decode the reply.
    ///
    /// # Errors
    ///
    /// Returns the remote status on a non-2xx response, `DEADLINE_EXCEEDED`
    /// when the deadline passes, and `UNAVAILABLE` when the service cannot be
    /// reached.
    pub async fn call<Req, Resp>(&self, method: &str, kind: CallKind, request: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self.send(method, kind, request).await?;
        Ok(response.json::<Resp>().await?)
    }

    /// Invoke `method`, discarding any reply body.
    ///
    /// # Errors
    ///
    /// Same as [`RpcClient::call`].
    pub async fn call_empty<Req>(&self, method: &str, kind: CallKind, request: &Req) -> Result<()>
    where
        Req: Serialize + Sync + ?Sized,
    {
        self.send(method, kind, request).await.map(|_| ())
    }

    async fn send<Req>(&self, method: &str, kind: CallKind, request: &Req) -> Result<reqwest::Response>
    where
        Req: Serialize + Sync + ?Sized,
    {
        let url = format!("{}/{}/{}", self.base_url, self.service, method);
        let timeout = match kind {
            CallKind::Unary => self.timeouts.default,
            CallKind::Bulk => self.timeouts.bulk,
        };

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(service = self.service, method, error = %e, "Remote call failed");
                RpcError::from(e)
            })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error = match response.json::<StatusBody>().await {
            Ok(body) => RpcError::new(RpcCode::from_name(&body.code), body.message),
            Err(_) => RpcError::new(
                RpcCode::Unknown,
                format!("{} returned status {status}", self.service),
            ),
        };

        tracing::debug!(
            service = self.service,
            method,
            status = %status,
            code = %error.code,
            "Remote call returned an error status"
        );

        Err(error)
    }
}
