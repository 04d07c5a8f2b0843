//! The `/ws` endpoint: upgrades a connection, fans `ContinuousController`
//! events out to it via [`ClientHub`], and dispatches inbound commands to
//! [`FrameworkManager`](crate::manager::FrameworkManager).
//!
//! Grounded on the teacher's `nodes/ws.rs` writer/reader-task split: one task
//! pumps outbound messages from the connection's mpsc receiver onto the
//! socket, the main task reads inbound frames and dispatches them; either
//! side closing ends the connection.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use conclave_domain::{Error, Phase};
use futures_util::{SinkExt, StreamExt};

use super::protocol::{ClientInbound, ClientOutbound, RoomSummary};
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (sub_id, mut rx) = state.hub.subscribe();

    let greeting = ClientOutbound::Connection {
        connection_id: sub_id.to_string(),
    };
    if send(&mut sink, &greeting).await.is_err() {
        state.hub.unsubscribe(sub_id);
        return;
    }

    let mut writer_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if send(&mut sink, &msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        if writer_task.is_finished() {
            break;
        }
        let Message::Text(text) = msg else { continue };
        match serde_json::from_str::<ClientInbound>(&text) {
            Ok(inbound) => handle_inbound(&state, sub_id, inbound).await,
            Err(e) => {
                let err = ClientOutbound::Error {
                    code: "BAD_REQUEST".into(),
                    message: format!("malformed message: {e}"),
                    room_id: None,
                };
                let _ = state.hub.send_to(sub_id, err).await;
            }
        }
    }

    state.hub.unsubscribe(sub_id);
    writer_task.abort();
}

async fn send(
    sink: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    msg: &ClientOutbound,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(msg).unwrap_or_default();
    sink.send(Message::Text(text)).await
}

async fn handle_inbound(state: &AppState, sub_id: u64, inbound: ClientInbound) {
    match inbound {
        ClientInbound::GetRooms => match list_room_summaries(state) {
            Ok(rooms) => {
                let _ = state.hub.send_to(sub_id, ClientOutbound::RoomsList { rooms }).await;
            }
            Err(e) => {
                let _ = state.hub.send_to(sub_id, error_reply(&e)).await;
            }
        },
        ClientInbound::JoinRoom { room_id } | ClientInbound::GetRoomHistory { room_id } => {
            match state.manager.store().read_turns(&room_id) {
                Ok(turns) => {
                    for turn in turns {
                        let _ = state
                            .hub
                            .send_to(
                                sub_id,
                                ClientOutbound::NewMessage {
                                    room_id: room_id.clone(),
                                    turn,
                                },
                            )
                            .await;
                    }
                }
                Err(e) => {
                    let _ = state.hub.send_to(sub_id, error_reply(&e)).await;
                }
            }
        }
        ClientInbound::CreateRoom { room_name, agents } => {
            let participants = agents.into_iter().map(Into::into).collect();
            match state.manager.create_room(&room_name, participants) {
                Ok(manifest) => {
                    let msg = ClientOutbound::RoomCreated {
                        room_id: manifest.room_id,
                        room_name: manifest.room_name,
                    };
                    state.hub.publish(msg, state.config.discussion.publish_timeout()).await;
                }
                Err(e) => {
                    let _ = state.hub.send_to(sub_id, error_reply(&e)).await;
                }
            }
        }
        ClientInbound::DeleteRoom { room_id } => match state.manager.delete_room(&room_id) {
            Ok(()) => {
                state
                    .hub
                    .publish(ClientOutbound::RoomDeleted { room_id }, state.config.discussion.publish_timeout())
                    .await;
            }
            Err(e) => {
                let _ = state.hub.send_to(sub_id, error_reply(&e)).await;
            }
        },
        ClientInbound::SendMessage { room_id, content } => {
            if let Err(e) = state.manager.send_user_message(&room_id, content).await {
                let _ = state.hub.send_to(sub_id, error_reply(&e)).await;
            }
        }
        ClientInbound::DiscussionControl { room_id, command } => {
            if let Err(e) = state.manager.control(&room_id, command).await {
                let _ = state.hub.send_to(sub_id, error_reply(&e)).await;
            }
        }
    }
}

fn list_room_summaries(state: &AppState) -> conclave_domain::Result<Vec<RoomSummary>> {
    let ids = state.manager.store().list_rooms()?;
    let mut rooms = Vec::with_capacity(ids.len());
    for id in ids {
        let manifest = state.manager.store().load_manifest(&id)?;
        let phase = state.manager.status(&id).map(|s| s.phase).unwrap_or(Phase::Idle);
        rooms.push(RoomSummary {
            room_id: manifest.room_id,
            room_name: manifest.room_name,
            phase,
            participant_count: manifest.participants.len(),
        });
    }
    Ok(rooms)
}

fn error_reply(e: &Error) -> ClientOutbound {
    ClientOutbound::Error {
        code: e.code().to_string(),
        message: e.to_string(),
        room_id: None,
    }
}
