//! Logging setup utilities for the Machiya binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVER_CRATE: &str = "machiya_server";

/// Initialize the tracing subscriber with the specified default log level.
///
/// Directives are emitted for the server library crate, the binary and
/// `tower_http` (request tracing). The level can be overridden using the
/// `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "machiya-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use machiya_shared::logger::setup_logger;
///
/// setup_logger("machiya-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let binary = binary_name.replace('-', "_");
    let mut targets = vec![SERVER_CRATE, binary.as_str(), "tower_http"];
    targets.dedup();
    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}
