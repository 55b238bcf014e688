//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health probe and the proxy fallback
//! - Wire up middleware (request ID, tracing span, access log, panic recovery, request timeout)
//! - Dispatch requests through the route table and the fallback controller
//! - Serve plain or TLS, draining in-flight requests on shutdown
//! - Bound how long clients may take to send a request head

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
    routing::get,
    Router,
};
use axum_server::Handle;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, TimeoutConfig};
use crate::http::request::UuidRequestId;
use crate::lifecycle::ShutdownSignal;
use crate::net::tls::load_tls_config;
use crate::observability::logging::{AccessLog, RequestSpan};
use crate::observability::metrics;
use crate::proxy::{
    conditions_from_headers, method_not_allowed, write_failure, write_object, FallbackController,
    Fetcher, Resolution,
};
use crate::routing::RouteTable;
use crate::store::ObjectStore;

/// Error type for serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to load TLS material: {0}")]
    Tls(#[source] std::io::Error),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub controller: Arc<FallbackController>,
}

/// HTTP server for the asset proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Build the server around a shared object store handle.
    pub fn new(config: ProxyConfig, store: Arc<dyn ObjectStore>) -> Self {
        let routes = RouteTable::new(config.assets.bucket_path_prefix.clone());
        let spa_object_path = config
            .assets
            .spa_entrypoint()
            .map(|entry| routes.resolve_via_catch_all(entry));

        tracing::info!(
            prefix = %routes.prefix(),
            spa = spa_object_path.as_deref().unwrap_or("disabled"),
            fetch_timeout_secs = config.timeouts.fetch_secs,
            "Route table ready"
        );

        let controller = FallbackController::new(
            Fetcher::new(store),
            spa_object_path,
            config.timeouts.fetch(),
        );
        let state = AppState {
            routes: Arc::new(routes),
            controller: Arc::new(controller),
        };

        let router = Self::build_router(&config.timeouts, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(timeouts: &TimeoutConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(RequestSpan)
                    .on_response(AccessLog)
                    .on_failure(()),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(timeouts.request()));

        Router::new()
            .route("/healthz", get(healthz))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// The fully layered router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests for at most the signal's drain timeout.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        let listener = listener.into_std()?;

        let handle = Handle::new();
        let drain_timeout = shutdown.drain_timeout();
        tokio::spawn({
            let handle = handle.clone();
            async move {
                shutdown.recv().await;
                tracing::info!(drain_timeout_secs = drain_timeout.as_secs(), "Draining in-flight requests");
                handle.graceful_shutdown(Some(drain_timeout));
            }
        });

        let timeouts = &self.config.timeouts;
        let app = self.router.into_make_service();
        match &self.config.listener.tls {
            Some(tls) => {
                let rustls = load_tls_config(tls).await.map_err(ServerError::Tls)?;
                tracing::info!(address = %addr, "HTTPS server starting");
                let mut server = axum_server::from_tcp_rustls(listener, rustls);
                configure_connections(server.http_builder(), timeouts);
                server.handle(handle).serve(app).await?;
            }
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                let mut server = axum_server::from_tcp(listener);
                configure_connections(server.http_builder(), timeouts);
                server.handle(handle).serve(app).await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Per-connection limits. The header read timer also runs while a kept-alive
/// connection waits for its next request.
fn configure_connections(builder: &mut ConnBuilder<TokioExecutor>, timeouts: &TimeoutConfig) {
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read_header())
        .keep_alive(timeouts.keep_alive());
}

/// A panicking handler answers 500 instead of dropping the connection.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    write_failure(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Liveness probe. Never touches the object store.
async fn healthz() -> &'static str {
    "OK"
}

/// Main proxy handler.
/// Resolves the object path, fetches with SPA fallback, and writes the result.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();

    if method != Method::GET && method != Method::HEAD {
        metrics::record_request(method.as_str(), 405, "none", started);
        return method_not_allowed();
    }

    let path = uri.path();
    let route = state.routes.match_path(path).name();
    let resolved = state.routes.resolve(path);

    tracing::debug!(route, object = %resolved, "Resolved request path");

    let conditions = conditions_from_headers(&headers);
    let response = match state.controller.run(&resolved, conditions).await {
        Resolution::Fetched { descriptor, .. } => write_object(descriptor, &method),
        Resolution::FinalFailure { status, error } => {
            if status.is_server_error() {
                tracing::error!(object = %resolved, error = %error, "Request failed");
            } else {
                tracing::debug!(object = %resolved, error = %error, "Request failed");
            }
            write_failure(status)
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), route, started);
    response
}
