//! Route variants.
//!
//! The gateway accepts two route shapes for the same logical operation.
//! They differ in the backend path, where the API version comes from,
//! and whether the outbound call declares a JSON content type.

/// Which inbound route matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteVariant {
    /// `POST /openai/deployments/{deployment}/chat/completions`
    ChatCompletions,
    /// `POST /openai/deployments/{deployment}/completions?api-version=..`
    LegacyCompletions,
}

impl RouteVariant {
    /// All variants, in registration order.
    pub const ALL: [RouteVariant; 2] = [RouteVariant::ChatCompletions, RouteVariant::LegacyCompletions];

    /// Axum route pattern for the inbound side.
    pub const fn route_path(self) -> &'static str {
        match self {
            RouteVariant::ChatCompletions => "/openai/deployments/{deployment}/chat/completions",
            RouteVariant::LegacyCompletions => "/openai/deployments/{deployment}/completions",
        }
    }

    /// Backend path segments following the deployment name.
    pub const fn operation_segments(self) -> &'static [&'static str] {
        match self {
            RouteVariant::ChatCompletions => &["chat", "completions"],
            RouteVariant::LegacyCompletions => &["completions"],
        }
    }

    /// Whether the outbound request carries `Content-Type: application/json`.
    pub const fn sets_json_content_type(self) -> bool {
        matches!(self, RouteVariant::ChatCompletions)
    }

    /// Whether the caller may choose the API version.
    pub const fn accepts_caller_api_version(self) -> bool {
        matches!(self, RouteVariant::LegacyCompletions)
    }

    /// Stable label for logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            RouteVariant::ChatCompletions => "chat_completions",
            RouteVariant::LegacyCompletions => "legacy_completions",
        }
    }
}

impl std::fmt::Display for RouteVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
