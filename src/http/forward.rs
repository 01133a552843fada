//! Upstream forwarding.
//!
//! # Responsibilities
//! - Own the single pooled HTTP client for the process
//! - Send exactly one POST per validated request
//! - Return whatever the backend answered, success or not
//!
//! # Design Decisions
//! - No retries and no redirect following; the backend's answer is final
//! - The response body is buffered in full before it is relayed, so a
//!   connection dropped mid-body becomes an error instead of a truncated reply
//! - Cancellation is by drop: when the inbound call goes away, the handler
//!   future and the in-flight upstream call are dropped together

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendConfig, TimeoutConfig};
use crate::http::request::{Credential, API_KEY_HEADER};

/// A request ready to be sent upstream.
#[derive(Debug)]
pub struct OutboundRequest {
    pub url: Url,
    pub credential: Credential,
    /// Byte-identical copy of the inbound body.
    pub body: Bytes,
    /// Send `Content-Type: application/json`.
    pub json_content_type: bool,
}

/// What the backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Transport-level failures. Backend error statuses are not errors.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Upstream request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("Upstream request failed")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ForwardError::Timeout(e)
        } else {
            ForwardError::Transport(e)
        }
    }
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Handle to the shared upstream client. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Build the pooled client. Call once per process.
    pub fn new(timeouts: &TimeoutConfig, backend: &BackendConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .pool_idle_timeout(Duration::from_secs(timeouts.pool_idle_secs))
            .redirect(reqwest::redirect::Policy::none());

        if !backend.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Send the request and collect the full backend response.
    pub async fn forward(&self, request: OutboundRequest) -> Result<BackendResponse, ForwardError> {
        let mut builder = self
            .client
            .post(request.url)
            .header(API_KEY_HEADER, request.credential.header_value().clone());

        if request.json_content_type {
            builder = builder.header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok(BackendResponse { status, body })
    }
}
