//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    handler::{get_anomalies, get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid CORS origin '{0}'")]
    InvalidOrigin(String),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 背景タスクと CORS の設定
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// heartbeat の配信間隔
    pub heartbeat_interval: Duration,
    /// 異常検知サンプラーの評価間隔
    pub monitor_interval: Duration,
    /// CORS で許可するフロントエンドのオリジン
    pub allowed_origin: String,
}

/// Real-time game server
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(AppState::new(Dependencies::in_memory(verifier, clock)));
/// let server = Server::new(state, settings);
/// server.run("127.0.0.1", 4000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    settings: ServerSettings,
}

impl Server {
    pub fn new(state: Arc<AppState>, settings: ServerSettings) -> Self {
        Self { state, settings }
    }

    /// Build the axum router (WebSocket endpoint and read-only HTTP API)
    pub fn router(&self) -> Result<Router, ServerError> {
        let origin = HeaderValue::from_str(&self.settings.allowed_origin)
            .map_err(|_| ServerError::InvalidOrigin(self.settings.allowed_origin.clone()))?;
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST]);

        Ok(Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/anomalies", get(get_anomalies))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone()))
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// The heartbeat and the anomaly sampler run for the lifetime of the server
    /// and are aborted once it stops.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router()?;

        let heartbeat = self
            .state
            .heartbeat_usecase
            .clone()
            .spawn(self.settings.heartbeat_interval);
        let sampler = self
            .state
            .monitor_usecase
            .clone()
            .spawn_sampler(self.settings.monitor_interval);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        heartbeat.abort();
        sampler.abort();
        result?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Run the server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 4000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Machiya server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }
}
