//! WebSocket handler for console shell connections
//!
//! A shell connects to one session. Every state change is pushed as a full
//! snapshot; actions sent over the socket go through the same session actor
//! as the HTTP action route.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::application::services::WorkflowSession;
use crate::domain::value_objects::SessionId;
use crate::domain::workflow::{NavigationTarget, UserAction, WorkflowState};
use crate::infrastructure::http::{parse_id, session_error, ApiError};
use crate::infrastructure::state::AppState;

/// WebSocket upgrade handler; refuses unknown sessions before upgrading
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let session = match lookup(&state, &id).await {
        Ok(session) => session,
        Err(rejection) => return rejection.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, session))
}

async fn lookup(state: &AppState, id: &str) -> Result<WorkflowSession, ApiError> {
    let id: SessionId = parse_id(id, "session")?;
    state.sessions.read().await.get_session(id).map_err(session_error)
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, session: WorkflowSession) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let session_id = session.id();
    let _shell = session.attach_shell();

    // Create a channel for sending messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    tracing::info!(%session_id, "WebSocket connection established");

    // Spawn a task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let updates_task = tokio::spawn(forward_updates(session.clone(), tx.clone()));

    // Handle incoming messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => handle_message(msg, &session).await,
                    Err(e) => {
                        tracing::warn!(%session_id, "Failed to parse message: {}", e);
                        Some(ServerMessage::Error {
                            code: "PARSE_ERROR".to_string(),
                            message: format!("Invalid message format: {}", e),
                        })
                    }
                };
                if let Some(reply) = reply {
                    if tx.send(reply).is_err() {
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!(%session_id, "WebSocket connection closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(%session_id, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // The session outlives the socket; a reconnect picks up the latest snapshot
    updates_task.abort();
    send_task.abort();

    tracing::info!(%session_id, "WebSocket connection terminated");
}

/// Push the current snapshot, then every change and navigation request
async fn forward_updates(session: WorkflowSession, tx: mpsc::UnboundedSender<ServerMessage>) {
    let mut snapshots = session.subscribe();
    let mut navigation = session.navigation();

    let initial = snapshots.borrow_and_update().clone();
    if tx.send(ServerMessage::snapshot(&initial)).is_err() {
        return;
    }

    loop {
        let msg = tokio::select! {
            changed = snapshots.changed() => match changed {
                Ok(()) => {
                    let state = snapshots.borrow_and_update().clone();
                    ServerMessage::snapshot(&state)
                }
                Err(_) => ServerMessage::session_closed(),
            },
            target = navigation.recv() => match target {
                Ok(target) => ServerMessage::Navigate { target },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(session_id = %session.id(), skipped, "Navigation lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => ServerMessage::session_closed(),
            },
        };

        let closed = matches!(msg, ServerMessage::Error { .. });
        if tx.send(msg).is_err() || closed {
            break;
        }
    }
}

async fn handle_message(msg: ClientMessage, session: &WorkflowSession) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Action { action } => {
            tracing::debug!(session_id = %session.id(), action = action.name(), "Action received");
            // The resulting snapshot arrives through the watch channel
            match session.dispatch(action).await {
                Ok(_) => None,
                Err(e) => Some(ServerMessage::Error {
                    code: "SESSION_CLOSED".to_string(),
                    message: e.to_string(),
                }),
            }
        }
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),
    }
}

/// Messages from the console shell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Dispatch a user action to the session
    Action { action: UserAction },
    /// Keep-alive
    Heartbeat,
}

/// Messages to the console shell
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full session state after a change
    Snapshot { state: WorkflowState },
    /// The shell should leave the workflow view
    Navigate { target: NavigationTarget },
    Error { code: String, message: String },
    Pong,
}

impl ServerMessage {
    fn snapshot(state: &WorkflowState) -> Self {
        Self::Snapshot {
            state: state.clone(),
        }
    }

    fn session_closed() -> Self {
        Self::Error {
            code: "SESSION_CLOSED".to_string(),
            message: "Session closed".to_string(),
        }
    }
}
