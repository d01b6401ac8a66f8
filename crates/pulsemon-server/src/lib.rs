//! Pulsemon demo metrics backend.
//!
//! Serves the dashboard's read endpoints and the WebSocket push channel:
//! - JSON endpoints for health, fleet, metrics history, and stats
//! - `/ws` pushing synthetic metric samples and occasional alerts
//! - Tabular CSV/JSON export of the metrics history
//!
//! There is no monitored infrastructure behind it; every value is synthetic.

pub mod api;
pub mod config;
pub mod export;
pub mod mock;
pub mod push;
pub mod server;
pub mod state;

pub use api::{ApiError, create_api_router};
pub use config::ServerConfig;
pub use export::{ColumnSpec, ExportError, ExportFormat, default_filename, export_rows};
pub use mock::{
    AlertSeverity, HistoryPoint, MetricsSample, ServerAlert, ServerDescriptor, ServerHealth,
    ServerStatus, default_fleet,
};
pub use push::PushMessage;
pub use server::MonitorServer;
pub use state::{AppState, ServerStats, StatsSnapshot};
