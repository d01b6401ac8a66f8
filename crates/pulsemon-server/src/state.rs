//! Shared server state and aggregate counters.

use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use crate::config::ServerConfig;
use crate::mock::{ServerDescriptor, default_fleet};

/// Aggregate counters exposed by `/api/stats`.
///
/// All counters are relaxed atomics; exact cross-counter consistency is not
/// needed for a stats endpoint.
#[derive(Debug, Default)]
pub struct ServerStats {
    active_connections: AtomicI64,
    total_connections: AtomicU64,
    samples_pushed: AtomicU64,
    alerts_pushed: AtomicU64,
}

impl ServerStats {
    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn sample_pushed(&self) {
        self.samples_pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alert_pushed(&self) {
        self.alerts_pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, uptime_secs: u64) -> StatsSnapshot {
        StatsSnapshot {
            active_connections: self.active_connections.load(Ordering::Relaxed),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            samples_pushed: self.samples_pushed.load(Ordering::Relaxed),
            alerts_pushed: self.alerts_pushed.load(Ordering::Relaxed),
            uptime_secs,
        }
    }
}

/// Point-in-time view of [`ServerStats`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub active_connections: i64,
    pub total_connections: u64,
    pub samples_pushed: u64,
    pub alerts_pushed: u64,
    pub uptime_secs: u64,
}

/// State shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub fleet: Vec<ServerDescriptor>,
    pub stats: ServerStats,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            fleet: default_fleet(),
            stats: ServerStats::default(),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
