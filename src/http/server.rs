//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router from the compiled route table
//! - Mount the WebSocket entrypoints
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener and shut down gracefully

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    map_response_body::MapResponseBodyLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::WebletConfig;
use crate::http::dispatch::HttpDispatcher;
use crate::http::websocket::websocket_handler;
use crate::lifecycle::Site;

/// HTTP server for one site.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving `site`.
    pub fn new(config: WebletConfig, site: Arc<Site>) -> Self {
        let router = Self::build_router(&config, site);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// All methods of one URI template share a single method router, so
    /// each template is mounted exactly once.
    #[allow(deprecated)]
    fn build_router(config: &WebletConfig, site: Arc<Site>) -> Router {
        let dispatcher = HttpDispatcher::new(site.renderer(), config.limits.max_body_bytes);
        let mut ws_paths: BTreeSet<String> = site.websocket_paths().iter().cloned().collect();
        let mut router = Router::new();

        for (path, routes) in site.routes().by_path() {
            let mut method_router: MethodRouter<Arc<Site>> = MethodRouter::new();
            for route in routes {
                let route = Arc::new(route.clone());
                let dispatcher = dispatcher.clone();
                method_router = method_router.on(route.method().filter(), move |request: Request<Body>| {
                    let route = route.clone();
                    let dispatcher = dispatcher.clone();
                    async move { dispatcher.dispatch(&route, request).await }
                });
            }
            if ws_paths.remove(path) {
                method_router = method_router.get(websocket_handler);
            }
            router = router.route(path, method_router);
        }

        for ws_path in &ws_paths {
            router = router.route(ws_path, get(websocket_handler));
        }

        router.with_state(site).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                .layer(MapResponseBodyLayer::new(Body::new))
                .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes)),
        )
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The assembled router, for serving through another stack.
    pub fn into_router(self) -> Router {
        self.router
    }
}
