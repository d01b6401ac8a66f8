//! WebSocket push channel.
//!
//! Each connected client gets its own ticker: every interval the server
//! pushes one metrics sample and, with independent per-tick probability, one
//! alert. The ticker lives inside the per-connection task, so disconnecting
//! stops the pushes for that client and nothing else.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::mock::{self, MetricsSample, ServerAlert};
use crate::state::AppState;

/// Frames pushed to connected clients, tagged by payload kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PushMessage {
    Metrics(MetricsSample),
    Alert(ServerAlert),
}

/// Handle WebSocket upgrade on `/ws`.
pub async fn handle_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one client connection until it closes.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::now_v7().to_string();
    state.stats.connection_opened();
    info!(connection = %connection_id, "push client connected");

    let (mut sender, mut receiver) = socket.split();
    let mut ticker = tokio::time::interval(state.config.push_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sample = PushMessage::Metrics(mock::sample_metrics());
                if send_frame(&mut sender, &sample).await.is_err() {
                    break;
                }
                state.stats.sample_pushed();

                if rand::thread_rng().gen_bool(state.config.alert_probability) {
                    let alert = PushMessage::Alert(mock::random_alert(&state.fleet));
                    if send_frame(&mut sender, &alert).await.is_err() {
                        break;
                    }
                    state.stats.alert_pushed();
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(message)) => {
                        // Clients only listen on this channel.
                        debug!(connection = %connection_id, ?message, "ignoring client frame");
                    }
                    Some(Err(e)) => {
                        debug!(connection = %connection_id, error = %e, "push socket error");
                        break;
                    }
                }
            }
        }
    }

    state.stats.connection_closed();
    info!(connection = %connection_id, "push client disconnected");
}

async fn send_frame(
    sender: &mut (impl SinkExt<Message> + Unpin),
    frame: &PushMessage,
) -> Result<(), ()> {
    let json = serde_json::to_string(frame).unwrap_or_default();
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}
