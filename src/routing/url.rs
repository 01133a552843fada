//! Backend URL construction.
//!
//! # Responsibilities
//! - Resolve the backend base URL (Azure host or configured override)
//! - Append the deployment and operation path segments
//! - Attach the `api-version` query parameter
//!
//! # Design Decisions
//! - Segments go through `Url::path_segments_mut`, so `/`, `?`, `#` and `%`
//!   in caller input are percent-encoded instead of reshaping the URL
//! - Missing settings are errors; nothing falls back to a guessed value

use thiserror::Error;
use url::Url;

use crate::config::schema::BackendConfig;
use crate::routing::variant::RouteVariant;

/// Query parameter carrying the backend wire-contract version.
pub const API_VERSION_PARAM: &str = "api-version";

/// First `api-version` value in a raw query string.
///
/// Decoding is lossy and never fails; repeated keys keep the first value.
pub fn api_version_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == API_VERSION_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Errors building a backend URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlBuildError {
    #[error("Backend service name is not configured")]
    MissingServiceName,

    #[error("Backend service name is not a valid host label")]
    InvalidServiceName,

    #[error("Backend API version is not configured")]
    MissingApiVersion,

    #[error("Backend endpoint is not a valid base URL")]
    InvalidEndpoint,

    #[error("Invalid deployment name")]
    InvalidDeployment,
}

impl UrlBuildError {
    /// True when the gateway, not the caller, is at fault.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, UrlBuildError::InvalidDeployment)
    }
}

/// Build the backend URL for one request.
///
/// For [`RouteVariant::ChatCompletions`] the API version always comes from
/// `backend.api_version` and `caller_api_version` is ignored. For
/// [`RouteVariant::LegacyCompletions`] the caller's value wins and the
/// configured one is the fallback.
pub fn build_backend_url(
    backend: &BackendConfig,
    variant: RouteVariant,
    deployment: &str,
    caller_api_version: Option<&str>,
) -> Result<Url, UrlBuildError> {
    if matches!(deployment, "" | "." | "..") {
        return Err(UrlBuildError::InvalidDeployment);
    }

    let caller_api_version = caller_api_version
        .filter(|_| variant.accepts_caller_api_version())
        .filter(|v| !v.trim().is_empty());
    let api_version = caller_api_version
        .or_else(|| non_blank(&backend.api_version))
        .ok_or(UrlBuildError::MissingApiVersion)?;

    let mut url = base_url(backend)?;
    url.set_query(None);
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|_| UrlBuildError::InvalidEndpoint)?
        .pop_if_empty()
        .extend(["openai", "deployments", deployment])
        .extend(variant.operation_segments());

    url.query_pairs_mut().append_pair(API_VERSION_PARAM, api_version);

    Ok(url)
}

fn base_url(backend: &BackendConfig) -> Result<Url, UrlBuildError> {
    if let Some(endpoint) = non_blank(&backend.endpoint) {
        return Url::parse(endpoint).map_err(|_| UrlBuildError::InvalidEndpoint);
    }

    let service = non_blank(&backend.service_name).ok_or(UrlBuildError::MissingServiceName)?;
    if !service.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(UrlBuildError::InvalidServiceName);
    }

    Url::parse(&format!("https://{service}.openai.azure.com/"))
        .map_err(|_| UrlBuildError::InvalidServiceName)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> BackendConfig {
        BackendConfig {
            service_name: Some("myservice".into()),
            api_version: Some("2023-05-15".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_api_version_from_query() {
        assert_eq!(api_version_from_query(None), None);
        assert_eq!(api_version_from_query(Some("foo=bar")), None);
        assert_eq!(
            api_version_from_query(Some("api-version=2022-12-01")).as_deref(),
            Some("2022-12-01")
        );
        assert_eq!(
            api_version_from_query(Some("api-version=a&api-version=b")).as_deref(),
            Some("a")
        );
        assert_eq!(
            api_version_from_query(Some("x=1&api-version=2024%2D02%2D01")).as_deref(),
            Some("2024-02-01")
        );
        // Invalid percent-escapes decode lossily instead of failing
        assert!(api_version_from_query(Some("api-version=%FF")).is_some());
    }

    #[test]
    fn test_chat_completions_url() {
        let url = build_backend_url(&backend(), RouteVariant::ChatCompletions, "gpt4", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://myservice.openai.azure.com/openai/deployments/gpt4/chat/completions?api-version=2023-05-15"
        );
    }

    #[test]
    fn test_chat_completions_ignores_caller_version() {
        let url = build_backend_url(
            &backend(),
            RouteVariant::ChatCompletions,
            "gpt4",
            Some("1999-01-01"),
        )
        .unwrap();
        assert_eq!(url.query(), Some("api-version=2023-05-15"));
    }

    #[test]
    fn test_legacy_completions_url() {
        let url = build_backend_url(
            &backend(),
            RouteVariant::LegacyCompletions,
            "gpt35",
            Some("2022-12-01"),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://myservice.openai.azure.com/openai/deployments/gpt35/completions?api-version=2022-12-01"
        );
    }

    #[test]
    fn test_legacy_falls_back_to_configured_version() {
        let url = build_backend_url(&backend(), RouteVariant::LegacyCompletions, "gpt35", None).unwrap();
        assert_eq!(url.query(), Some("api-version=2023-05-15"));
    }

    #[test]
    fn test_missing_service_name() {
        let mut backend = backend();
        backend.service_name = Some("   ".into());

        let err = build_backend_url(&backend, RouteVariant::ChatCompletions, "gpt4", None).unwrap_err();
        assert_eq!(err, UrlBuildError::MissingServiceName);
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_missing_api_version() {
        let mut backend = backend();
        backend.api_version = None;

        assert_eq!(
            build_backend_url(&backend, RouteVariant::ChatCompletions, "gpt4", None),
            Err(UrlBuildError::MissingApiVersion)
        );
        // The legacy route can still be served when the caller names a version
        assert!(build_backend_url(&backend, RouteVariant::LegacyCompletions, "gpt4", Some("2022-12-01")).is_ok());
    }

    #[test]
    fn test_service_name_cannot_redirect_host() {
        let mut backend = backend();
        backend.service_name = Some("evil.example.com/#".into());

        assert_eq!(
            build_backend_url(&backend, RouteVariant::ChatCompletions, "gpt4", None),
            Err(UrlBuildError::InvalidServiceName)
        );
    }

    #[test]
    fn test_deployment_is_percent_encoded() {
        let url = build_backend_url(
            &backend(),
            RouteVariant::ChatCompletions,
            "a/../b?x=1#frag",
            None,
        )
        .unwrap();
        assert_eq!(url.host_str(), Some("myservice.openai.azure.com"));
        assert_eq!(
            url.path(),
            "/openai/deployments/a%2F..%2Fb%3Fx=1%23frag/chat/completions"
        );
        assert_eq!(url.query(), Some("api-version=2023-05-15"));
    }

    #[test]
    fn test_caller_version_cannot_inject_query() {
        let url = build_backend_url(
            &backend(),
            RouteVariant::LegacyCompletions,
            "gpt35",
            Some("2022-12-01&foo=bar"),
        )
        .unwrap();
        assert_eq!(url.query(), Some("api-version=2022-12-01%26foo%3Dbar"));
    }

    #[test]
    fn test_dot_segments_rejected() {
        for deployment in ["", ".", ".."] {
            assert_eq!(
                build_backend_url(&backend(), RouteVariant::ChatCompletions, deployment, None),
                Err(UrlBuildError::InvalidDeployment)
            );
        }
        assert!(!UrlBuildError::InvalidDeployment.is_configuration_error());
    }

    #[test]
    fn test_endpoint_override() {
        let backend = BackendConfig {
            service_name: None,
            api_version: Some("2023-05-15".into()),
            endpoint: Some("http://127.0.0.1:9000/prefix/?stale=1".into()),
            ..Default::default()
        };

        let url = build_backend_url(&backend, RouteVariant::LegacyCompletions, "gpt35", None).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/prefix/openai/deployments/gpt35/completions?api-version=2023-05-15"
        );
    }
}
