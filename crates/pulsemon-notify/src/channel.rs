//! Delivery channel client.
//!
//! Maintains a long-lived WebSocket connection to a pulsemon server, decodes
//! the pushed frames, forwards alert payloads into the
//! [`NotificationService`], and re-broadcasts metric samples to any local
//! consumer. Reconnects with capped exponential backoff.

use chrono::{DateTime, Utc};
use error_stack::Report;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::service::{NotificationService, ServerEvent};

/// Errors raised by the delivery channel transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChannelError {
    #[error("WebSocket connect failed: {0}")]
    Connect(String),

    #[error("WebSocket transport error: {0}")]
    Transport(String),
}

/// Error-stack–backed result alias for channel operations.
pub type ChannelResult<T> = ::std::result::Result<T, Report<ChannelError>>;

/// Extension trait to convert `Result<T, ChannelError>` into [`ChannelResult<T>`].
pub trait IntoChannelReport<T> {
    /// Wrap the error in an `error_stack::Report`.
    fn into_report(self) -> ChannelResult<T>;
}

impl<T> IntoChannelReport<T> for ::std::result::Result<T, ChannelError> {
    #[inline]
    fn into_report(self) -> ChannelResult<T> {
        self.map_err(Report::new)
    }
}

/// One synthetic metrics sample as pushed by the server.
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

/// One alert payload as pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub severity: String,
    pub message: String,
    pub server: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ServerAlert> for ServerEvent {
    fn from(alert: ServerAlert) -> Self {
        Self {
            severity: alert.severity,
            title: None,
            message: alert.message,
            server: Some(alert.server),
            duration_ms: None,
        }
    }
}

/// Frames carried on the push connection, tagged by payload kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PushFrame {
    Metrics(MetricsSample),
    Alert(ServerAlert),
}

/// Delivery channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Push endpoint, e.g. `ws://127.0.0.1:4000/ws`.
    pub url: String,
    /// Upper bound for the reconnect backoff.
    pub max_backoff_secs: u64,
    /// Capacity of the local metrics broadcast.
    pub metrics_buffer: usize,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_backoff_secs: 60,
            metrics_buffer: 256,
        }
    }

    pub fn with_max_backoff_secs(mut self, secs: u64) -> Self {
        self.max_backoff_secs = secs;
        self
    }
}

/// Long-lived client side of the push transport.
pub struct DeliveryChannel {
    config: ChannelConfig,
    service: NotificationService,
    metrics_tx: broadcast::Sender<MetricsSample>,
}

impl DeliveryChannel {
    pub fn new(config: ChannelConfig, service: NotificationService) -> Self {
        let (metrics_tx, _) = broadcast::channel(config.metrics_buffer);
        Self {
            config,
            service,
            metrics_tx,
        }
    }

    /// Subscribe to the metric samples relayed from the server.
    pub fn subscribe_metrics(&self) -> broadcast::Receiver<MetricsSample> {
        self.metrics_tx.subscribe()
    }

    /// Run the connection loop until the task is dropped.
    ///
    /// A clean server close resets the backoff; errors double it up to the
    /// configured cap.
    pub async fn run(&self) {
        let mut backoff = 1;
        loop {
            match self.connect_and_stream().await {
                Ok(()) => {
                    info!(url = %self.config.url, "delivery channel closed by server");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    backoff = 1;
                }
                Err(e) => {
                    error!(url = %self.config.url, error = ?e, backoff, "delivery channel error, reconnecting");
                    tokio::time::sleep(std::time::Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(self.config.max_backoff_secs);
                }
            }
        }
    }

    /// Connect once and pump frames until the connection ends.
    pub async fn connect_and_stream(&self) -> ChannelResult<()> {
        let (stream, _) = connect_async(self.config.url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))
            .into_report()?;
        info!(url = %self.config.url, "delivery channel connected");

        let (mut write, mut read) = stream.split();
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => self.handle_frame(&text),
                Ok(Message::Ping(payload)) => {
                    if write.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ChannelError::Transport(e.to_string())).into_report();
                }
            }
        }

        Ok(())
    }

    /// Decode one pushed frame and route it.
    ///
    /// Unrecognized frames are logged and dropped; a malformed frame must
    /// never take the channel down.
    fn handle_frame(&self, text: &str) {
        match serde_json::from_str::<PushFrame>(text) {
            Ok(PushFrame::Metrics(sample)) => {
                // No receivers is fine; panels come and go.
                let _ = self.metrics_tx.send(sample);
            }
            Ok(PushFrame::Alert(alert)) => {
                debug!(server = %alert.server, severity = %alert.severity, "alert received");
                self.service.ingest_server_event(&ServerEvent::from(alert));
            }
            Err(e) => {
                warn!(error = %e, "ignoring unrecognized push frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemorySlot;
    use crate::service::ServiceConfig;
    use std::sync::Arc;

    fn channel() -> DeliveryChannel {
        let service = NotificationService::new(
            ServiceConfig::default(),
            Arc::new(MemorySlot::new()),
        );
        DeliveryChannel::new(ChannelConfig::new("ws://127.0.0.1:1/ws"), service)
    }

    #[test]
    fn test_push_frame_decodes_metrics() {
        let json = r#"{
            "type": "metrics",
            "data": {
                "timestamp": "2026-08-07T12:00:00Z",
                "cpu": 42.5,
                "memory": 61.0,
                "disk": 33.3,
                "networkIn": 512.0,
                "networkOut": 128.0,
                "activeConnections": 87
            }
        }"#;
        let frame: PushFrame = serde_json::from_str(json).unwrap();
        match frame {
            PushFrame::Metrics(sample) => {
                assert_eq!(sample.active_connections, 87);
                assert!((sample.cpu - 42.5).abs() < f64::EPSILON);
            }
            other => panic!("expected metrics frame, got {other:?}"),
        }
    }

    #[test]
    fn test_push_frame_decodes_alert() {
        let json = r#"{
            "type": "alert",
            "data": {
                "id": "a-1",
                "type": "critical",
                "message": "High CPU utilization detected",
                "server": "Web-01",
                "timestamp": "2026-08-07T12:00:02Z"
            }
        }"#;
        let frame: PushFrame = serde_json::from_str(json).unwrap();
        assert!(matches!(frame, PushFrame::Alert(ref a) if a.server == "Web-01"));
    }

    #[tokio::test]
    async fn test_alert_frame_reaches_the_service() {
        let channel = channel();
        channel.handle_frame(
            r#"{"type":"alert","data":{"id":"a-2","type":"warning",
                "message":"Memory pressure above threshold","server":"DB-01",
                "timestamp":"2026-08-07T12:00:04Z"}}"#,
        );

        let list = channel.service.get_notifications();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, crate::notification::NotificationKind::Warning);
        assert_eq!(list[0].title, crate::service::DEFAULT_ALERT_TITLE);
    }

    #[tokio::test]
    async fn test_metrics_frame_is_rebroadcast() {
        let channel = channel();
        let mut rx = channel.subscribe_metrics();
        channel.handle_frame(
            r#"{"type":"metrics","data":{"timestamp":"2026-08-07T12:00:00Z",
                "cpu":10.0,"memory":20.0,"disk":30.0,"networkIn":1.0,
                "networkOut":2.0,"activeConnections":3}}"#,
        );

        let sample = rx.try_recv().unwrap();
        assert_eq!(sample.active_connections, 3);
        assert!(channel.service.get_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped() {
        let channel = channel();
        channel.handle_frame("NOT JSON");
        channel.handle_frame(r#"{"type":"unknown","data":{}}"#);
        assert!(channel.service.get_notifications().is_empty());
    }
}
