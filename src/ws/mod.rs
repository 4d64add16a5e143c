pub mod handlers;
pub mod host;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::replication::{SyncPayload, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// `true` opens the host console, anything else a viewer
    pub host: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let role = Role::from_host_flag(params.host.as_deref());
    tracing::info!("WebSocket connection request: role={:?}", role);

    ws.on_upgrade(move |socket| handle_socket(socket, role, state))
}

/// Latest state for a fresh connection, read from the live state
async fn initial_sync(state: &AppState) -> SyncPayload {
    SyncPayload::from_state(&state.snapshot().await)
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("WebSocket connected with role: {:?}", role);

    // Subscribe before reading the state so no publish falls in between
    let mut sync_rx = state.replicator.subscribe();
    let mut viewer_rx = (role == Role::Viewer).then(|| state.viewer_broadcast.subscribe());

    let mut greeting = vec![
        ServerMessage::Welcome {
            protocol: PROTOCOL_VERSION,
            role,
            screen: state.screen().await,
        },
        ServerMessage::Sync(initial_sync(&state).await),
    ];
    if role == Role::Host {
        greeting.push(host::bank_status(&state).await);
        greeting.push(host::host_panel(&state).await);
    }

    for msg in greeting {
        if let Ok(json) = serde_json::to_string(&msg) {
            if sender.send(Message::Text(json.into())).await.is_err() {
                tracing::error!("Failed to send welcome message");
                return;
            }
        }
    }

    loop {
        tokio::select! {
            // Replicated state (all clients)
            sync_msg = sync_rx.recv() => {
                let payload = match sync_msg {
                    Ok(payload) => payload,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Connection lagged, skipped {} payload(s)", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if let Ok(json) = serde_json::to_string(&ServerMessage::Sync(payload)) {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }

            // Viewer-only ticks
            viewer_msg = async {
                match &mut viewer_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // Host: wait forever
                        std::future::pending::<Option<ServerMessage>>().await
                    }
                }
            } => {
                if let Some(msg) = viewer_msg {
                    if let Ok(json) = serde_json::to_string(&msg) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        // Viewers never mutate; their commands are dropped unread
                        if role != Role::Host {
                            continue;
                        }
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &role, &state).await
                                {
                                    if let Ok(json) = serde_json::to_string(&response) {
                                        if sender.send(Message::Text(json.into())).await.is_err() {
                                            tracing::error!("Failed to send response");
                                            break;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::debug!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}
