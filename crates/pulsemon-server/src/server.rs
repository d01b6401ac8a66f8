//! Demo server assembly.
//!
//! Wires the API routes and the push channel into one axum router and runs
//! it.

use axum::{Router, http::Method, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::create_api_router;
use crate::config::ServerConfig;
use crate::push;
use crate::state::AppState;

/// Demo metrics server.
pub struct MonitorServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl MonitorServer {
    /// Create a new server from configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(AppState::new(config.clone()));
        Self { config, state }
    }

    /// Shared state handle, e.g. for inspecting counters in tests.
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        let api_router = create_api_router(self.state.clone());
        let ws_router = Router::new()
            .route("/ws", get(push::handle_upgrade))
            .with_state(self.state.clone());

        let mut router = Router::new().nest("/api", api_router).merge(ws_router);

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the server
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.socket_addr();
        let router = self.build_router();

        info!("Starting pulsemon server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }

    /// Start the server in background
    pub fn start_background(
        self,
    ) -> tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>> {
        tokio::spawn(async move { self.start().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_state_is_shared() {
        let server = MonitorServer::new(ServerConfig::default());
        let state = server.state();
        let _router = server.build_router();

        state.stats.connection_opened();
        assert_eq!(server.state().stats.snapshot(0).total_connections, 1);
    }
}
