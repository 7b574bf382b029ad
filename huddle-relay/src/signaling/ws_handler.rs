use crate::room::{RoomCommand, RoomManager};
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ConnectionId, MemberInfo, ServerMessage};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

pub struct AppState {
    pub signaling: SignalingService,
    pub room_manager: RoomManager,
}

type CurrentRoom = Arc<Mutex<Option<mpsc::Sender<RoomCommand>>>>;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // The connection id is minted here, never client-supplied, so it is
    // genuinely ephemeral to this channel.
    let connection_id = ConnectionId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, state))
}

async fn handle_socket(socket: WebSocket, connection_id: ConnectionId, state: Arc<AppState>) {
    info!(%connection_id, "New signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_connection(connection_id, tx);

    // The room this connection currently belongs to. Shared between the
    // receive loop (join / leave-room) and the teardown below, so the
    // Leave command fires exactly once whichever path ends the channel.
    let current_room: CurrentRoom = Arc::new(Mutex::new(None));

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let current_room = current_room.clone();
        let state = state.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            handle_client_message(connection_id, client_msg, &state, &current_room)
                                .await;
                        }
                        Err(e) => warn!(%connection_id, "Invalid client message: {:?}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.signaling.remove_connection(&connection_id);

    // Abrupt channel loss lands here with the membership still in place;
    // an explicit leave-room already took the sender out.
    if let Some(room_tx) = current_room.lock().await.take() {
        let _ = room_tx.send(RoomCommand::Leave { connection_id }).await;
    }

    info!(%connection_id, "Signaling connection closed");
}

async fn handle_client_message(
    connection_id: ConnectionId,
    message: ClientMessage,
    state: &Arc<AppState>,
    current_room: &CurrentRoom,
) {
    match message {
        ClientMessage::JoinRoom {
            room_id,
            participant_id,
            display_name,
        } => {
            let room_tx = state.room_manager.get_room_sender(&room_id);
            let member = MemberInfo {
                connection_id,
                participant_id,
                display_name,
            };

            {
                let mut current = current_room.lock().await;
                if let Some(previous) = current.replace(room_tx.clone()) {
                    // One membership per channel: switching rooms moves it.
                    let _ = previous.send(RoomCommand::Leave { connection_id }).await;
                }
            }

            if room_tx.send(RoomCommand::Join { member }).await.is_err() {
                error!(%connection_id, "Room actor is gone");
            }
        }

        ClientMessage::Offer {
            to,
            sdp,
            participant_id,
            display_name,
        } => {
            forward(
                connection_id,
                to,
                ServerMessage::Offer {
                    from: connection_id,
                    sdp,
                    participant_id,
                    display_name,
                },
                current_room,
            )
            .await;
        }

        ClientMessage::Answer { to, sdp } => {
            forward(
                connection_id,
                to,
                ServerMessage::Answer {
                    from: connection_id,
                    sdp,
                },
                current_room,
            )
            .await;
        }

        ClientMessage::IceCandidate { to, candidate } => {
            forward(
                connection_id,
                to,
                ServerMessage::IceCandidate {
                    from: connection_id,
                    candidate,
                },
                current_room,
            )
            .await;
        }

        ClientMessage::LeaveRoom => {
            if let Some(room_tx) = current_room.lock().await.take() {
                let _ = room_tx.send(RoomCommand::Leave { connection_id }).await;
            }
        }
    }
}

async fn forward(
    connection_id: ConnectionId,
    to: ConnectionId,
    message: ServerMessage,
    current_room: &CurrentRoom,
) {
    let room_tx = current_room.lock().await.clone();
    let Some(room_tx) = room_tx else {
        debug!(%connection_id, "Ignoring directed message before join");
        return;
    };

    let _ = room_tx
        .send(RoomCommand::Forward {
            from: connection_id,
            to,
            message,
        })
        .await;
}
