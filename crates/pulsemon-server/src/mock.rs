//! Synthetic fleet and metrics generation.
//!
//! There is no monitored infrastructure behind this server; every number is
//! drawn from a plausible range on demand.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reported health of a fleet node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerHealth {
    Online,
    Warning,
    Offline,
}

/// Static identity of one fleet node.
#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    pub id: u32,
    pub name: String,
    pub ip: String,
    pub status: ServerHealth,
}

impl ServerDescriptor {
    fn new(id: u32, name: &str, ip: &str, status: ServerHealth) -> Self {
        Self {
            id,
            name: name.to_string(),
            ip: ip.to_string(),
            status,
        }
    }
}

/// The demo fleet served by `/api/servers` and referenced in alerts.
pub fn default_fleet() -> Vec<ServerDescriptor> {
    vec![
        ServerDescriptor::new(1, "Web-01", "192.168.1.10", ServerHealth::Online),
        ServerDescriptor::new(2, "DB-01", "192.168.1.20", ServerHealth::Warning),
        ServerDescriptor::new(3, "Cache-01", "192.168.1.30", ServerHealth::Online),
    ]
}

/// Fleet node descriptor with point-in-time resource numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub id: u32,
    pub name: String,
    pub ip: String,
    pub status: ServerHealth,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub latency: f64,
    pub last_update: DateTime<Utc>,
}

/// Randomize current resource usage for every fleet node.
pub fn sample_fleet(fleet: &[ServerDescriptor]) -> Vec<ServerStatus> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    fleet
        .iter()
        .map(|node| ServerStatus {
            id: node.id,
            name: node.name.clone(),
            ip: node.ip.clone(),
            status: node.status,
            cpu: rng.gen_range(20.0..90.0),
            memory: rng.gen_range(30.0..80.0),
            disk: rng.gen_range(20.0..60.0),
            latency: rng.gen_range(5.0..50.0),
            last_update: now,
        })
        .collect()
}

/// One push-channel metrics sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSample {
    pub timestamp: DateTime<Utc>,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network_in: f64,
    pub network_out: f64,
    pub active_connections: u64,
}

/// Draw a fresh metrics sample.
pub fn sample_metrics() -> MetricsSample {
    let mut rng = rand::thread_rng();
    MetricsSample {
        timestamp: Utc::now(),
        cpu: rng.gen_range(0.0..100.0),
        memory: rng.gen_range(30.0..80.0),
        disk: rng.gen_range(20.0..60.0),
        network_in: rng.gen_range(0.0..1000.0),
        network_out: rng.gen_range(0.0..500.0),
        active_connections: rng.gen_range(0..1000),
    }
}

/// One hourly point of the `/api/metrics/history` series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub time: DateTime<Utc>,
    pub cpu: f64,
    pub memory: f64,
    pub network_in: f64,
    pub network_out: f64,
}

/// Generate `hours` hourly samples, oldest first, ending at the current hour.
pub fn history(hours: u32) -> Vec<HistoryPoint> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    (0..hours)
        .rev()
        .map(|offset| HistoryPoint {
            time: now - chrono::TimeDelta::hours(i64::from(offset)),
            cpu: rng.gen_range(40.0..70.0),
            memory: rng.gen_range(50.0..80.0),
            network_in: rng.gen_range(0.0..1000.0),
            network_out: rng.gen_range(0.0..500.0),
        })
        .collect()
}

/// Alert severities pushed on the channel. Only the two urgent kinds are
/// ever synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// One alert payload pushed on the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub message: String,
    pub server: String,
    pub timestamp: DateTime<Utc>,
}

const ALERT_MESSAGES: &[&str] = &[
    "High CPU utilization detected",
    "Memory pressure above threshold",
    "Disk latency spike observed",
    "Connection pool nearing saturation",
];

/// Synthesize an alert against a random fleet node.
pub fn random_alert(fleet: &[ServerDescriptor]) -> ServerAlert {
    let mut rng = rand::thread_rng();
    let severity = if rng.gen_bool(0.5) {
        AlertSeverity::Warning
    } else {
        AlertSeverity::Critical
    };
    let message = ALERT_MESSAGES
        .choose(&mut rng)
        .copied()
        .unwrap_or(ALERT_MESSAGES[0]);
    let server = fleet
        .choose(&mut rng)
        .map(|node| node.name.clone())
        .unwrap_or_else(|| "Web-01".to_string());

    ServerAlert {
        id: Uuid::now_v7().to_string(),
        severity,
        message: message.to_string(),
        server,
        timestamp: Utc::now(),
    }
}
