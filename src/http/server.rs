//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Build the downstream service proxies from configuration
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::client::{aloha_service, hola_service, ClientError, GreetingService};
use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::lifecycle::shutdown;
use crate::observability::HeaderPropagator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub hostname: Arc<str>,
    pub hola: GreetingService,
    pub aloha: GreetingService,
}

impl AppState {
    /// This instance's own greeting.
    pub fn greeting(&self) -> String {
        format!("Olá de {}", self.hostname)
    }
}

/// HTTP server for the ola service.
pub struct OlaServer {
    router: Router,
    config: ServiceConfig,
}

impl OlaServer {
    /// Create a server whose downstream calls go over HTTP.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let propagator = Arc::new(
            HeaderPropagator::new(&config.propagation.headers).map_err(ServerError::HeaderName)?,
        );
        tracing::info!(
            headers = ?propagator.names(),
            "Tracing header propagation configured"
        );

        let hola = hola_service(&config.clients.hola, propagator.clone())?;
        let aloha = aloha_service(&config.clients.aloha, propagator)?;
        Ok(Self::with_services(config, hola, aloha))
    }

    /// Create a server around already-built downstream services.
    pub fn with_services(config: ServiceConfig, hola: GreetingService, aloha: GreetingService) -> Self {
        let state = AppState {
            hostname: config.identity.resolve_hostname().into(),
            hola,
            aloha,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/api/ola", get(handlers::ola))
            .route("/api/ola-chaining", get(handlers::ola_chaining))
            .route("/api/ola-aloha", get(handlers::ola_aloha))
            .route("/api/health", get(handlers::health))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http());

        // Outermost, so handlers and the trace span both see the generated id.
        if config.propagation.generate_request_id {
            router.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        } else {
            router
        }
    }

    /// The router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid propagation header: {0}")]
    HeaderName(axum::http::header::InvalidHeaderName),

    #[error(transparent)]
    Client(#[from] ClientError),
}
