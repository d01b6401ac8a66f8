//! pulsemon-server — entry point.
//!
//! Reads configuration from environment variables and starts the demo
//! metrics backend.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PULSEMON_HOST` | `0.0.0.0` | Interface to bind. |
//! | `PULSEMON_PORT` | `4000` | TCP port to listen on. |
//! | `PULSEMON_PUSH_INTERVAL_MS` | `2000` | Push interval per connection. |
//! | `PULSEMON_ALERT_PROBABILITY` | `0.1` | Per-tick alert probability. |

use std::time::Duration;

use pulsemon_server::{MonitorServer, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pulsemon_server=info".parse().expect("valid directive")),
        )
        .init();

    let host = std::env::var("PULSEMON_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PULSEMON_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4000);
    let push_interval_ms: u64 = std::env::var("PULSEMON_PUSH_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(2000);
    let alert_probability: f64 = std::env::var("PULSEMON_ALERT_PROBABILITY")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.10);

    let config = ServerConfig::new()
        .with_host(&host)
        .with_port(port)
        .with_push_interval(Duration::from_millis(push_interval_ms))
        .with_alert_probability(alert_probability);

    info!(
        host = %config.host,
        port = config.port,
        push_interval_ms,
        alert_probability = config.alert_probability,
        "pulsemon server configuration loaded"
    );

    if let Err(e) = MonitorServer::new(config).start().await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
