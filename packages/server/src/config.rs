//! Command-line / environment configuration.

use std::time::Duration;

use clap::Parser;

use crate::ui::ServerSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "machiya-server")]
#[command(about = "Real-time presence and broadcast server for Machiya", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "MACHIYA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Shared secret for verifying HS256 handshake tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Frontend origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    /// Seconds between heartbeat broadcasts
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub heartbeat_interval_secs: u64,

    /// Seconds between anomaly sampler runs
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub monitor_interval_secs: u64,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn settings(&self) -> ServerSettings {
        ServerSettings {
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            monitor_interval: Duration::from_secs(self.monitor_interval_secs),
            allowed_origin: self.frontend_url.clone(),
        }
    }
}
