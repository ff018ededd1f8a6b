//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request id, tracing, timeout, lockdown, CORS)
//! - Bind server to listener and shut down gracefully
//!
//! # Layer order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → Timeout → lockdown → CORS → proxy_handler
//! ```
//! Lockdown sits outside CORS so blocked paths never get CORS headers and
//! preflights for API paths are answered without touching the upstream.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::uri::Authority, http::HeaderName, middleware, routing::any, Router};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, Site};
use crate::gateway::{CanonicalOrigin, Pipeline, ResponseHostRewriter, SurfaceDetector};
use crate::http::middleware::lockdown_middleware;
use crate::http::proxy::proxy_handler;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::security::cors::cors_layer;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub detector: Arc<SurfaceDetector>,
    pub rewriter: Arc<ResponseHostRewriter>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
    pub upstream_timeout_secs: u64,
    pub assume_https: bool,
    pub debug_log: bool,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(config: &GatewayConfig, site: &Site) -> Result<Self, axum::http::uri::InvalidUri> {
        let upstream = Authority::from_str(&config.upstream.address)?;

        let mut self_origins: Vec<CanonicalOrigin> = site.canonical_origin.iter().cloned().collect();
        if let Some(origin) = CanonicalOrigin::parse(&format!("http://{}", upstream)) {
            self_origins.push(origin);
        }

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            pipeline: Arc::new(Pipeline::from_config(config, site)),
            detector: Arc::new(SurfaceDetector::new(
                config.lockdown.api_root.clone(),
                config.lockdown.admin_prefix.clone(),
            )),
            rewriter: Arc::new(ResponseHostRewriter::new(
                config.lockdown.api_root.clone(),
                self_origins,
            )),
            client,
            upstream,
            upstream_timeout_secs: config.timeouts.upstream_secs,
            assume_https: config.listener.assume_https,
            debug_log: site.debug_log,
            max_body_size: config.security.max_body_size,
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig, site: &Site) -> Result<Self, axum::http::uri::InvalidUri> {
        let state = AppState::new(&config, site)?;
        let router = Self::build_router(&config, site, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, site: &Site, state: AppState) -> Router {
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state.clone());

        let router = if site.jwt_cors_enable {
            router.layer(cors_layer(&config.cors))
        } else {
            router
        };

        let request_id = HeaderName::from_static(X_REQUEST_ID);
        router
            .layer(middleware::from_fn_with_state(state, lockdown_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuidV4))
    }

    /// The router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
