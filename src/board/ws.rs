use axum::{
    body::Bytes,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::api::{ApiError, SharedState};
use super::auth::CurrentUser;
use super::models::*;

/// How often to send WebSocket Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// How long to wait for a Pong response before considering the connection dead.
const PONG_TIMEOUT: Duration = Duration::from_secs(60);

/// A serialized message tagged with the workspace it belongs to. Sockets
/// only forward events of the workspace they were opened for.
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub workspace_id: i64,
    pub payload: String,
}

// ── WebSocket message types ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    TaskCreated {
        task: Task,
    },
    TaskUpdated {
        task: Task,
    },
    TaskDeleted {
        task_id: i64,
    },
    /// Result of a Kanban drag and drop.
    TasksReordered {
        tasks: Vec<Task>,
    },

    ProjectCreated {
        project: Project,
    },
    ProjectUpdated {
        project: Project,
    },
    ProjectDeleted {
        project_id: i64,
    },

    MemberJoined {
        member: Member,
    },
    MemberUpdated {
        member: Member,
    },
    MemberRemoved {
        member_id: i64,
    },

    WorkspaceUpdated {
        workspace: WorkspaceInfo,
    },
    // The new code is never pushed; admins refetch the workspace.
    InviteCodeReset {
        workspace_id: i64,
    },
    WorkspaceDeleted {
        workspace_id: i64,
    },
}

// ── WebSocket handler ────────────────────────────────────────────────

/// Live updates for one workspace. Members only.
pub async fn ws_handler(
    CurrentUser(user): CurrentUser,
    State(state): State<SharedState>,
    Path(workspace_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .call(move |db| db.require_member(workspace_id, user.id))
        .await?;
    let rx = state.ws_tx.subscribe();
    tracing::debug!(workspace_id, user_id = user.id, "WebSocket subscribed");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, workspace_id, rx)))
}

async fn handle_socket(socket: WebSocket, workspace_id: i64, rx: broadcast::Receiver<WsEvent>) {
    let (sender, receiver) = socket.split();
    run_socket_loop(sender, receiver, rx, workspace_id).await;
}

/// Core WebSocket loop with ping/pong keepalive.
///
/// Combines broadcast forwarding, client message receiving, and periodic
/// ping/pong health checking into a single select loop. If no Pong is
/// received within [`PONG_TIMEOUT`] after a Ping is sent, the connection
/// is considered dead and the loop exits.
async fn run_socket_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    mut rx: broadcast::Receiver<WsEvent>,
    workspace_id: i64,
) {
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    // The first tick completes immediately.
    ping_interval.tick().await;

    let mut last_pong = Instant::now();
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if awaiting_pong && last_pong.elapsed() > PONG_TIMEOUT {
                    tracing::debug!(workspace_id, "WebSocket pong timeout");
                    break;
                }
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
                awaiting_pong = true;
            }

            result = rx.recv() => {
                match result {
                    Ok(event) if event.workspace_id == workspace_id => {
                        if sender.send(Message::Text(event.payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(workspace_id, skipped, "WebSocket client lagged");
                        continue;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    // Best-effort close frame
    let _ = sender.send(Message::Close(None)).await;
}

// ── Broadcast helper ─────────────────────────────────────────────────

/// Serialize and broadcast a WsMessage to the sockets of one workspace.
/// Returns silently even if no clients are connected.
pub fn broadcast_message(tx: &broadcast::Sender<WsEvent>, workspace_id: i64, msg: &WsMessage) {
    match serde_json::to_string(msg) {
        Ok(payload) => {
            let _ = tx.send(WsEvent {
                workspace_id,
                payload,
            }); // Ignore error if no receivers
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WsMessage");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
