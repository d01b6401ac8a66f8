//! pulsemon-watch — console notification watcher.
//!
//! Connects to a pulsemon server's push endpoint, runs pushed alerts through
//! a local notification service, and logs every bus event. Useful for
//! exercising the delivery contract without a browser attached.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PULSEMON_SERVER_URL` | `ws://127.0.0.1:4000/ws` | Push endpoint to watch. |
//! | `PULSEMON_STATE_DIR` | `.pulsemon` | Directory holding the notification slot. |

use std::sync::Arc;

use pulsemon_notify::{
    ChannelConfig, DeliveryChannel, EventKind, FileSlot, NotificationEvent, NotificationService,
    ServiceConfig,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pulsemon_notify=info".parse()?),
        )
        .init();

    let url = std::env::var("PULSEMON_SERVER_URL")
        .unwrap_or_else(|_| "ws://127.0.0.1:4000/ws".to_string());
    let state_dir =
        std::env::var("PULSEMON_STATE_DIR").unwrap_or_else(|_| ".pulsemon".to_string());

    let slot = Arc::new(FileSlot::new(&state_dir)?);
    let service = NotificationService::new(ServiceConfig::default(), slot);
    info!(
        url = %url,
        restored = service.get_notifications().len(),
        "watcher starting"
    );

    let _new_sub = service.bus().subscribe(EventKind::New, |event| {
        if let NotificationEvent::New(n) = event {
            info!(kind = %n.kind, title = %n.title, message = %n.message, "notification");
        }
    });
    let _updated_sub = service.bus().subscribe(EventKind::Updated, |event| {
        if let NotificationEvent::Updated(snapshot) = event {
            let unread = snapshot.iter().filter(|n| !n.read).count();
            debug!(total = snapshot.len(), unread, "panel state updated");
        }
    });

    let channel = DeliveryChannel::new(ChannelConfig::new(&url), service.clone());

    let mut metrics = channel.subscribe_metrics();
    tokio::spawn(async move {
        while let Ok(sample) = metrics.recv().await {
            debug!(
                cpu = sample.cpu,
                memory = sample.memory,
                connections = sample.active_connections,
                "metrics sample"
            );
        }
    });

    tokio::select! {
        _ = channel.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    Ok(())
}
