use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::metrics::WS_CONNECTIONS_ACTIVE;
use crate::models::wire::ClientFrame;
use crate::services::AppState;

/// GET /ws upgrades to the event transport. Each socket gets a fresh
/// connection id; that id is the caller's identity for everything else.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.hub.register(&conn_id, tx);
    WS_CONNECTIONS_ACTIVE.inc();
    tracing::info!(conn = %conn_id, "client connected");

    // Outbound pump: envelopes queued by the hub become text frames.
    let pump = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&envelope) else {
                continue;
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(frame) => {
                    Arc::clone(&state.controller).dispatch(&conn_id, &frame.event, frame.args);
                }
                Err(error) => {
                    tracing::debug!(conn = %conn_id, %error, "undecodable frame");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    tracing::info!(conn = %conn_id, "client disconnected");
    state.controller.disconnect(&conn_id);
    state.hub.unregister(&conn_id);
    WS_CONNECTIONS_ACTIVE.dec();
    pump.abort();
}
