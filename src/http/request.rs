//! Inbound request validation.
//!
//! # Responsibilities
//! - Short-circuit when simulated overload is on
//! - Require the `api-key` credential header
//! - Require a non-blank body
//!
//! # Design Decisions
//! - Rules run in a fixed order; the overload check comes first and skips
//!   the rest
//! - The credential is returned as an opaque [`Credential`] so it cannot be
//!   printed by accident
//! - The body is never parsed; only blankness is checked

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

use crate::routing::RouteVariant;

/// Credential header forwarded to the backend.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("api-key");

/// Everything the gateway needs from one inbound call.
///
/// No `Debug` impl: the headers carry the credential.
pub struct InboundRequest {
    pub variant: RouteVariant,
    /// `None` when the path segment did not decode to UTF-8.
    pub deployment: Option<String>,
    /// Caller-supplied `api-version`, if any.
    pub api_version: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The caller's `api-key` value, kept opaque.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(HeaderValue);

impl Credential {
    pub fn new(mut value: HeaderValue) -> Self {
        value.set_sensitive(true);
        Self(value)
    }

    /// Header value to attach to the outbound request.
    pub fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Why a request was answered locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Too many requests (simulated overload)")]
    Overloaded { retry_after_secs: Option<u64> },

    #[error("Missing api key")]
    MissingCredential,

    #[error("Missing request body")]
    MissingBody,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::Overloaded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Rejection::MissingCredential | Rejection::MissingBody => StatusCode::BAD_REQUEST,
        }
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Overloaded { .. } => "overloaded",
            Rejection::MissingCredential => "missing_credential",
            Rejection::MissingBody => "missing_body",
        }
    }
}

/// Overload simulation state for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overload {
    pub simulate: bool,
    pub retry_after_secs: Option<u64>,
}

/// Validate an inbound request, returning the credential to forward.
pub fn validate(request: &InboundRequest, overload: Overload) -> Result<Credential, Rejection> {
    if overload.simulate {
        return Err(Rejection::Overloaded {
            retry_after_secs: overload.retry_after_secs,
        });
    }

    let credential = request
        .headers
        .get(&API_KEY_HEADER)
        .cloned()
        .map(Credential::new)
        .ok_or(Rejection::MissingCredential)?;

    if is_blank(&request.body) {
        return Err(Rejection::MissingBody);
    }

    Ok(credential)
}

/// Empty or whitespace-only. Bytes that are not UTF-8 are never blank.
fn is_blank(body: &[u8]) -> bool {
    match std::str::from_utf8(body) {
        Ok(text) => text.trim().is_empty(),
        Err(_) => false,
    }
}
