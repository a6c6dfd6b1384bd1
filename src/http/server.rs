//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener and drain on shutdown
//! - Start the eviction monitor alongside the server

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    routing::{get, post, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{EvictionConfig, GatewayConfig};
use crate::health::EvictionMonitor;
use crate::http::handlers;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::Shutdown;
use crate::proxy::{Dispatcher, Forwarder};
use crate::registry::Registry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the integrator gateway.
pub struct GatewayServer {
    router: Router,
    registry: Arc<Registry>,
    eviction: EvictionConfig,
}

impl GatewayServer {
    /// Create a new HTTP server over an already bootstrapped registry.
    pub fn new(config: &GatewayConfig, registry: Arc<Registry>) -> reqwest::Result<Self> {
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), Forwarder::new()?));
        let state = AppState {
            registry: registry.clone(),
            dispatcher,
        };

        Ok(Self {
            router: Self::build_router(config, state),
            registry,
            eviction: config.eviction.clone(),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let proxy: MethodRouter<AppState> = get(handlers::proxy)
            .post(handlers::proxy)
            .put(handlers::proxy)
            .patch(handlers::proxy)
            .delete(handlers::proxy);

        Router::new()
            .route("/deploy", post(handlers::deploy))
            .route("/undeploy", post(handlers::undeploy))
            .route("/applications", get(handlers::list_applications))
            .route("/applications/{id}/resources", get(handlers::list_resources))
            .route(
                "/applications/resources/{identifier}",
                get(handlers::find_resource),
            )
            .route("/status", get(handlers::status))
            .route("/proxy/{application}", proxy.clone())
            .route("/proxy/{application}/", proxy.clone())
            .route("/proxy/{application}/{*path}", proxy)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = %request_id(request),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    )))
                    .map_response(|res: axum::http::Response<_>| res.map(Body::new))
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size)),
            )
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let monitor = if self.eviction.enabled {
            let monitor = EvictionMonitor::new(
                self.registry.clone(),
                Duration::from_secs(self.eviction.interval_secs),
            );
            Some(tokio::spawn(monitor.run(shutdown.subscribe())))
        } else {
            tracing::info!("Eviction disabled");
            None
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(Shutdown::wait(shutdown.subscribe()))
            .await?;

        // The monitor exits on the same signal; make sure it has.
        shutdown.trigger();
        if let Some(handle) = monitor {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Eviction monitor task failed");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
