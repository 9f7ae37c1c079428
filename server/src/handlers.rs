use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use muralboard_shared::votes::{merge_vote_maps, VoteRecord};
use muralboard_shared::{ClientMessage, PeerInfo, ServerMessage, Submission};

use crate::error::ApiError;
use crate::logic::{apply_client_message, Fanout, Reply};
use crate::state::{now_millis_string, pick_color, AppState, Peer, DEFAULT_BRUSH_SIZE};
use crate::storage;

pub async fn vote_data(State(state): State<AppState>) -> Json<HashMap<String, VoteRecord>> {
    Json(state.votes.read().await.clone())
}

pub async fn save_votes(
    State(state): State<AppState>,
    Json(remote): Json<HashMap<String, VoteRecord>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = {
        let mut votes = state.votes.write().await;
        merge_vote_maps(&mut votes, &remote);
        votes.clone()
    };
    storage::save_votes(&state.data_dir, &snapshot).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

pub async fn submissions(State(state): State<AppState>) -> Json<Vec<Submission>> {
    Json(state.submissions.read().await.clone())
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection_id = Uuid::new_v4();
    let info = PeerInfo {
        id: connection_id.to_string(),
        color: pick_color().to_string(),
        brush_size: DEFAULT_BRUSH_SIZE,
        connected_at: now_millis_string(),
    };

    {
        let mut peers = state.peers.write().await;
        peers.insert(
            connection_id,
            Peer {
                info: info.clone(),
                tx,
            },
        );
        tracing::info!(peer = %info.id, color = %info.color, peers = peers.len(), "peer connected");
    }

    // Identity and roster go straight down the socket before the fan-out
    // task takes over; the new peer must see itself in the roster.
    let users = state.roster().await;
    if let Ok(payload) = bincode::encode_to_vec(
        &ServerMessage::Welcome {
            user: info.clone(),
            users,
        },
        bincode::config::standard(),
    ) {
        if let Err(error) = socket_sender.send(Message::Binary(payload)).await {
            tracing::warn!(peer = %info.id, ?error, "welcome send failed");
        }
    }
    broadcast_except(
        &state,
        connection_id,
        ServerMessage::UserConnected { user: info.clone() },
    )
    .await;

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Ok(payload) = bincode::encode_to_vec(&message, bincode::config::standard()) {
                if socket_sender.send(Message::Binary(payload)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(Ok(message)) = socket_receiver.next().await {
        let client_message = match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(parsed) => parsed,
                Err(_) => continue,
            },
            Message::Binary(data) => {
                match bincode::decode_from_slice::<ClientMessage, _>(
                    &data,
                    bincode::config::standard(),
                ) {
                    Ok((parsed, _)) => parsed,
                    Err(_) => continue,
                }
            }
            Message::Close(_) => break,
            _ => continue,
        };

        let sender_info = {
            let peers = state.peers.read().await;
            match peers.get(&connection_id) {
                Some(peer) => peer.info.clone(),
                None => break,
            }
        };
        let Some(reply) = apply_client_message(&sender_info, client_message) else {
            continue;
        };
        match reply {
            Reply::Broadcast(message, Fanout::Others) => {
                broadcast_except(&state, connection_id, message).await;
            }
            Reply::Broadcast(message, Fanout::All) => {
                broadcast_all(&state, message).await;
            }
            Reply::Submissions => {
                let submissions = state.submissions.read().await.clone();
                let peers = state.peers.read().await;
                if let Some(peer) = peers.get(&connection_id) {
                    let _ = peer.tx.send(ServerMessage::SubmissionsList { submissions });
                }
            }
            Reply::StoreSubmission(submission) => {
                let snapshot = {
                    let mut submissions = state.submissions.write().await;
                    submissions.push(submission.clone());
                    submissions.clone()
                };
                if let Err(error) = storage::save_submissions(&state.data_dir, &snapshot).await {
                    tracing::warn!(%error, "failed to persist submissions");
                }
                broadcast_except(
                    &state,
                    connection_id,
                    ServerMessage::SubmissionCreated { submission },
                )
                .await;
            }
            Reply::BrushSize(size) => {
                {
                    let mut peers = state.peers.write().await;
                    if let Some(peer) = peers.get_mut(&connection_id) {
                        peer.info.brush_size = size;
                    }
                }
                broadcast_all(
                    &state,
                    ServerMessage::BrushSizeUpdated {
                        user_id: sender_info.id.clone(),
                        size,
                    },
                )
                .await;
            }
        }
    }

    {
        let mut peers = state.peers.write().await;
        peers.remove(&connection_id);
        tracing::info!(peer = %info.id, peers = peers.len(), "peer disconnected");
    }
    send_task.abort();

    let users = state.roster().await;
    broadcast_all(&state, ServerMessage::UsersList { users }).await;
}

pub async fn broadcast_except(state: &AppState, sender: Uuid, message: ServerMessage) {
    let mut stale = Vec::new();
    {
        let peers = state.peers.read().await;
        for (id, peer) in peers.iter() {
            if *id == sender {
                continue;
            }
            if peer.tx.send(message.clone()).is_err() {
                stale.push(*id);
            }
        }
    }
    prune(state, stale).await;
}

pub async fn broadcast_all(state: &AppState, message: ServerMessage) {
    let mut stale = Vec::new();
    {
        let peers = state.peers.read().await;
        for (id, peer) in peers.iter() {
            if peer.tx.send(message.clone()).is_err() {
                stale.push(*id);
            }
        }
    }
    prune(state, stale).await;
}

async fn prune(state: &AppState, stale: Vec<Uuid>) {
    if stale.is_empty() {
        return;
    }
    let mut peers = state.peers.write().await;
    for id in stale {
        peers.remove(&id);
    }
}
