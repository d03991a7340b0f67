//! HTTP server exposing the gateway's search surface over axum, with the
//! same signal-driven graceful shutdown the teacher's stdio server used.

pub mod handlers;

use crate::resilience::health::HealthCheckManager;
use crate::{Config, Result, Router as GatewayRouter};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state handed to every axum handler.
pub struct AppState {
    pub router: Arc<GatewayRouter>,
    pub health: Arc<HealthCheckManager>,
}

pub struct Server {
    config: Arc<Config>,
    state: Arc<AppState>,
    cancellation_token: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(config: Arc<Config>, router: Arc<GatewayRouter>, health: Arc<HealthCheckManager>) -> Self {
        Self {
            config,
            state: Arc::new(AppState { router, health }),
            cancellation_token: CancellationToken::new(),
        }
    }

    fn build_router(&self) -> Router {
        Router::new()
            .route("/v1/search", post(handlers::search))
            .route("/v1/search/vector", post(handlers::vector_search))
            .route("/v1/search/hybrid", post(handlers::hybrid_search))
            .route("/healthz", get(handlers::healthz))
            .route("/readyz", get(handlers::readyz))
            .route("/metrics", get(handlers::metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.state))
    }

    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.bind_address, self.config.server.port);
        info!(%addr, "starting gateway HTTP server");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Internal(format!("failed to bind {addr}: {e}")))?;

        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("failed to install SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, initiating graceful shutdown"),
                _ = sigint.recv() => info!("received SIGINT, initiating graceful shutdown"),
            }

            shutdown_token.cancel();
        });

        let app = self.build_router();
        let shutdown_signal = self.cancellation_token.clone();
        let shutdown_timeout =
            tokio::time::Duration::from_secs(self.config.server.graceful_shutdown_timeout_secs);

        let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_signal.cancelled().await;
        });

        let result = tokio::time::timeout(
            shutdown_timeout + tokio::time::Duration::from_secs(3600),
            serve,
        )
        .await;

        match result {
            Ok(Ok(())) => {
                info!("gateway HTTP server shut down cleanly");
                Ok(())
            }
            Ok(Err(e)) => Err(crate::Error::Internal(format!("server error: {e}"))),
            Err(_) => {
                warn!("graceful shutdown timeout exceeded, forcing shutdown");
                Ok(())
            }
        }
    }

    pub fn shutdown(&self) {
        warn!("initiating server shutdown");
        self.cancellation_token.cancel();
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ProviderManager;
    use crate::query::QueryProcessor;
    use std::time::Duration;

    #[test]
    fn server_starts_without_shutdown_requested() {
        let config = Arc::new(Config::default());
        let manager = Arc::new(ProviderManager::new(Duration::from_secs(3600)));
        let processor = Arc::new(QueryProcessor::new());
        let router = Arc::new(GatewayRouter::new(manager, processor, 8));
        let health = Arc::new(HealthCheckManager::new());
        let server = Server::new(config, router, health);
        assert!(!server.is_shutdown_requested());
    }

    #[test]
    fn shutdown_sets_cancellation_token() {
        let config = Arc::new(Config::default());
        let manager = Arc::new(ProviderManager::new(Duration::from_secs(3600)));
        let processor = Arc::new(QueryProcessor::new());
        let router = Arc::new(GatewayRouter::new(manager, processor, 8));
        let health = Arc::new(HealthCheckManager::new());
        let server = Server::new(config, router, health);
        server.shutdown();
        assert!(server.is_shutdown_requested());
    }
}
