// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live change streaming over WebSocket.
//!
//! Every committed store write is forwarded to connected clients as a JSON
//! [`LiveEvent`]. Events only say what changed. Clients re-read the HTTP
//! endpoints for current data.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use hemolink::{ChangeEvent, DonationStore};
use hemolink_api::LiveEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::AppState;

/// Message sent to each client when it connects.
pub const CONNECTED_MESSAGE: &str = "Connected to Hemolink live updates";

/// Serializes a live event for the wire.
pub fn encode_event(event: &LiveEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            error!(?e, "Failed to serialize live event");
            None
        }
    }
}

/// Handles WebSocket upgrade requests for live event streaming.
///
/// The change feed is subscribed before the upgrade completes so no write
/// committed after the handshake is missed.
///
/// # Arguments
///
/// * `ws` - WebSocket upgrade request
/// * `app_state` - The application state holding the store
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    let changes: broadcast::Receiver<ChangeEvent> = app_state.services.store.changes();
    ws.on_upgrade(move |socket| handle_socket(socket, changes))
}

/// Sends a connection confirmation, then forwards change events until the
/// client disconnects or the feed closes.
async fn handle_socket(socket: WebSocket, mut changes: broadcast::Receiver<ChangeEvent>) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();

    let connected: LiveEvent = LiveEvent::Connected {
        message: String::from(CONNECTED_MESSAGE),
    };
    if let Some(json) = encode_event(&connected)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event: LiveEvent = match changes.recv().await {
                Ok(change) => LiveEvent::from(&change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live client lagged behind the change feed");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let Some(json) = encode_event(&event) else {
                continue;
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Clients never send commands; drain until they close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}
