//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the two completion routes and `/healthz`
//! - Wire up middleware (sensitive headers, request ID, tracing, body limit)
//! - Run each request through validate → build URL → forward → relay
//! - Swap in reloaded configuration between requests
//! - Bind server to listener and shut down gracefully
//!
//! # Layer order on the completion routes
//! ```text
//! overload guard (loads the config snapshot, may answer 429)
//!     → body limit (413)
//!     → handler (infallible extraction, then validate)
//! ```

use arc_swap::ArcSwap;
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, DefaultBodyLimit, Path, RawQuery, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Extension, Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::error::ProxyError;
use crate::http::forward::{BackendResponse, Forwarder, OutboundRequest};
use crate::http::request::{validate, InboundRequest, Overload, Rejection, API_KEY_HEADER};
use crate::http::response::relay;
use crate::observability::metrics;
use crate::routing::{
    api_version_from_query, build_backend_url, RouteVariant, UrlBuildError, API_VERSION_PARAM,
};

const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live configuration; each request loads one snapshot in the overload guard.
    pub config: Arc<ArcSwap<GatewayConfig>>,
    /// The process-wide upstream client.
    pub forwarder: Forwarder,
}

/// Config snapshot taken once per request and handed to the handler.
#[derive(Clone)]
struct Snapshot(Arc<GatewayConfig>);

/// State for the per-route overload guard.
#[derive(Clone)]
struct GuardState {
    config: Arc<ArcSwap<GatewayConfig>>,
    variant: RouteVariant,
}

/// Startup failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<ArcSwap<GatewayConfig>>,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    ///
    /// The upstream client is built here and shared by every request.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let forwarder = Forwarder::new(&config.timeouts, &config.backend)?;
        let shared = Arc::new(ArcSwap::from_pointee(config.clone()));

        let state = AppState {
            config: shared.clone(),
            forwarder,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config: shared,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let max_body_size = config.limits.max_body_size;

        Router::new()
            .route("/healthz", get(healthz))
            .route(
                RouteVariant::ChatCompletions.route_path(),
                completion_route(
                    post(chat_completions),
                    RouteVariant::ChatCompletions,
                    &state,
                    max_body_size,
                ),
            )
            .route(
                RouteVariant::LegacyCompletions.route_path(),
                completion_route(
                    post(legacy_completions),
                    RouteVariant::LegacyCompletions,
                    &state,
                    max_body_size,
                ),
            )
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(SetSensitiveRequestHeadersLayer::new([API_KEY_HEADER]))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live configuration.
    pub fn config(&self) -> Arc<ArcSwap<GatewayConfig>> {
        self.config.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the current snapshot.
    /// Returns once `shutdown` fires and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let live = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_reload(&live, new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wrap a completion handler. Only matched methods are layered, so a GET
/// still gets 405 from the router.
fn completion_route(
    handler: MethodRouter<AppState>,
    variant: RouteVariant,
    state: &AppState,
    max_body_size: usize,
) -> MethodRouter<AppState> {
    let guard = GuardState {
        config: state.config.clone(),
        variant,
    };

    handler
        .route_layer(RequestBodyLimitLayer::new(max_body_size))
        .route_layer(middleware::from_fn_with_state(guard, overload_guard))
}

/// Store a reloaded config. Settings read at startup are reported, not applied.
fn apply_reload(live: &ArcSwap<GatewayConfig>, new_config: GatewayConfig) {
    let current = live.load();
    if current.listener != new_config.listener
        || current.timeouts != new_config.timeouts
        || current.limits != new_config.limits
        || current.observability != new_config.observability
        || current.backend.use_system_proxy != new_config.backend.use_system_proxy
    {
        tracing::warn!("Listener, timeout, limit, proxy and observability changes apply after restart");
    }

    tracing::info!(
        simulate_overload = new_config.overload.simulate,
        "Configuration reloaded"
    );
    live.store(Arc::new(new_config));
}

/// Take the request's config snapshot and answer 429 before anything else
/// looks at the request, including the body limit and route parameters.
async fn overload_guard(State(guard): State<GuardState>, mut req: Request, next: Next) -> Response {
    let config = guard.config.load_full();

    if config.overload.simulate {
        let log = RequestLog::new(guard.variant, None, req.headers());
        let rejection = Rejection::Overloaded {
            retry_after_secs: config.overload.retry_after_secs,
        };
        return log.fail(rejection.into());
    }

    req.extensions_mut().insert(Snapshot(config));
    next.run(req).await
}

async fn chat_completions(
    State(state): State<AppState>,
    Extension(Snapshot(config)): Extension<Snapshot>,
    deployment: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = InboundRequest {
        variant: RouteVariant::ChatCompletions,
        deployment: deployment.ok().map(|Path(d)| d),
        api_version: None,
        headers,
        body,
    };
    proxy(&state, &config, request).await
}

async fn legacy_completions(
    State(state): State<AppState>,
    Extension(Snapshot(config)): Extension<Snapshot>,
    deployment: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = InboundRequest {
        variant: RouteVariant::LegacyCompletions,
        deployment: deployment.ok().map(|Path(d)| d),
        api_version: api_version_from_query(query.as_deref()),
        headers,
        body,
    };
    proxy(&state, &config, request).await
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config.load();
    Json(serde_json::json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "overload_simulation": config.overload.simulate,
    }))
}

/// Per-request log and metric context.
struct RequestLog {
    request_id: String,
    variant: RouteVariant,
    deployment: Option<String>,
    start_time: Instant,
}

impl RequestLog {
    fn new(variant: RouteVariant, deployment: Option<String>, headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            request_id,
            variant,
            deployment,
            start_time: Instant::now(),
        }
    }

    fn deployment(&self) -> &str {
        self.deployment.as_deref().unwrap_or("-")
    }

    /// Log a locally answered request and turn it into a response.
    fn fail(&self, e: ProxyError) -> Response {
        match &e {
            ProxyError::Rejected(rejection) => {
                tracing::debug!(request_id = %self.request_id, reason = rejection.reason(), "Request rejected");
            }
            ProxyError::Url(err) if err.is_configuration_error() => {
                tracing::error!(request_id = %self.request_id, error = %err, "Backend configuration incomplete");
            }
            ProxyError::Url(err) => {
                tracing::debug!(request_id = %self.request_id, error = %err, "Invalid route parameter");
            }
            ProxyError::Forward(err) => {
                tracing::error!(
                    request_id = %self.request_id,
                    route = %self.variant,
                    deployment = %self.deployment(),
                    error = ?err,
                    "Upstream error"
                );
            }
        }

        if e.is_upstream() {
            metrics::record_upstream_error(e.reason());
        } else {
            metrics::record_rejection(e.reason());
        }
        self.complete(e.into_response())
    }

    /// Record the final status.
    fn complete(&self, response: Response) -> Response {
        let status = response.status();
        metrics::record_request(self.variant.as_str(), status.as_u16(), self.start_time);
        tracing::info!(
            request_id = %self.request_id,
            route = %self.variant,
            deployment = %self.deployment(),
            status = status.as_u16(),
            latency_ms = self.start_time.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
}

/// Main proxy path. Always produces exactly one response.
async fn proxy(state: &AppState, config: &GatewayConfig, request: InboundRequest) -> Response {
    let log = RequestLog::new(request.variant, request.deployment.clone(), &request.headers);

    tracing::debug!(
        request_id = %log.request_id,
        route = %log.variant,
        deployment = %log.deployment(),
        "Proxying request"
    );

    match forward_request(state, config, request).await {
        Ok(backend) => log.complete(relay(backend)),
        Err(e) => log.fail(e),
    }
}

async fn forward_request(
    state: &AppState,
    config: &GatewayConfig,
    request: InboundRequest,
) -> Result<BackendResponse, ProxyError> {
    let overload = Overload {
        simulate: config.overload.simulate,
        retry_after_secs: config.overload.retry_after_secs,
    };
    let credential = validate(&request, overload)?;

    let deployment = request
        .deployment
        .as_deref()
        .ok_or(UrlBuildError::InvalidDeployment)?;
    let url = build_backend_url(
        &config.backend,
        request.variant,
        deployment,
        request.api_version.as_deref(),
    )?;

    let api_version = url
        .query_pairs()
        .find(|(k, _)| k == API_VERSION_PARAM)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default();
    tracing::debug!(
        host = url.host_str().unwrap_or_default(),
        path = url.path(),
        api_version = %api_version,
        "Forwarding to backend"
    );

    let backend = state
        .forwarder
        .forward(OutboundRequest {
            url,
            credential,
            body: request.body,
            json_content_type: request.variant.sets_json_content_type(),
        })
        .await?;

    Ok(backend)
}
