//! Machiya real-time server.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev-secret cargo run --bin machiya-server
//! cargo run --bin machiya-server -- --host 0.0.0.0 --port 4000 --jwt-secret dev-secret
//! ```

use std::sync::Arc;

use clap::Parser;
use machiya_server::{
    config::ServerConfig,
    infrastructure::auth::JwtVerifier,
    ui::{AppState, Dependencies, Server},
};
use machiya_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Initialize dependencies in order:
    // 1. Clock / TokenVerifier
    // 2. Repository, ConnectionRegistry, GameCache
    // 3. UseCases (AppState)
    // 4. Server
    let clock = Arc::new(SystemClock);
    let token_verifier = Arc::new(JwtVerifier::new(config.jwt_secret.clone(), clock.clone()));
    let deps = Dependencies::in_memory(token_verifier, clock);
    let state = Arc::new(AppState::new(deps));

    let server = Server::new(state, config.settings());
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
