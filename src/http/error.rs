//! Request-path error taxonomy.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::forward::ForwardError;
use crate::http::request::Rejection;
use crate::http::response::plain_text;
use crate::routing::UrlBuildError;

/// Anything that ends a request before a backend answer is relayed.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Url(#[from] UrlBuildError),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Rejected(r) => r.status(),
            ProxyError::Url(e) if e.is_configuration_error() => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Url(_) => StatusCode::BAD_REQUEST,
            ProxyError::Forward(e) => e.status(),
        }
    }

    /// The backend could not be reached or did not answer in time.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ProxyError::Forward(_))
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            ProxyError::Rejected(r) => r.reason(),
            ProxyError::Url(e) if e.is_configuration_error() => "configuration",
            ProxyError::Url(_) => "invalid_deployment",
            ProxyError::Forward(ForwardError::Timeout(_)) => "upstream_timeout",
            ProxyError::Forward(ForwardError::Transport(_)) => "upstream_failure",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = plain_text(self.status(), self.to_string());

        if let ProxyError::Rejected(Rejection::Overloaded {
            retry_after_secs: Some(secs),
        }) = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}
