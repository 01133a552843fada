//! Response relay.
//!
//! # Responsibilities
//! - Copy the backend status and body into the client response
//! - Build plain-text responses for locally answered requests
//!
//! # Design Decisions
//! - Relayed bodies are copied byte-for-byte and always labelled JSON
//! - Local errors are plain UTF-8 text, never JSON
//! - Upstream headers are not relayed

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::forward::BackendResponse;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Relay a backend answer unchanged.
pub fn relay(backend: BackendResponse) -> Response {
    body_response(backend.status, JSON_CONTENT_TYPE, backend.body)
}

/// A locally generated plain-text response.
pub fn plain_text(status: StatusCode, message: impl Into<String>) -> Response {
    body_response(status, TEXT_CONTENT_TYPE, Bytes::from(message.into()))
}

fn body_response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}
