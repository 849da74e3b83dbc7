//! WebSocket handler for live reload.
//!
//! Registers each connection with the hub and forwards reload signals to the
//! client. Anything the client sends is ignored.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use super::connections::{ClientHandle, ConnectionId};
use super::hub::HubEvent;
use crate::state::AppState;

/// Handle WebSocket upgrade for live reload.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let id = ConnectionId::new();
    let (outbound, mut signals) = mpsc::unbounded_channel();

    if state
        .hub
        .send(HubEvent::Connected(id, ClientHandle::new(outbound)))
        .await
        .is_err()
    {
        // Notifier is shutting down
        return;
    }

    loop {
        tokio::select! {
            signal = signals.recv() => {
                let Some(signal) = signal else {
                    // Hub is gone; say goodbye properly
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                if socket.send(Message::text(signal.as_str())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Fails harmlessly once the hub has stopped
    let _ = state.hub.send(HubEvent::Disconnected(id)).await;
}
