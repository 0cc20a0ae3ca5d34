//! WebSocket handler for Axum
//!
//! The connection gateway: accepts upgrades, dispatches protocol events,
//! and coordinates the room registry, message store, and typing relay.
//! Connections are anonymous; the staff dashboard is authenticated
//! upstream before it ever issues a staff join.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use harborview_shared::{ChatMessage, Sender, STAFF_ROOM};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::state::AppState;

use super::{
    connection::Connection,
    events::{ClientEvent, ServerEvent},
    state::RelayState,
};

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state.relay.clone()))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, relay: RelayState) {
    let (mut sender, mut receiver) = socket.split();

    // Bounded channel for events to this connection; the registry drops
    // events for a connection whose buffer is full
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(relay.outbound_buffer);

    let conn = relay.add_connection(Connection::new(tx)).await;
    let session_id = conn.session_id;

    // Spawn task to send events to the client
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to serialize chat event");
                }
            }
        }
    });

    // Handle incoming events
    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        handle_client_event(event, Arc::clone(&conn), &relay).await;
                    }
                    Err(e) => {
                        // Misuse is tolerated, not answered; log and move on
                        tracing::warn!(
                            error = ?e,
                            message = %text,
                            "Failed to parse client event"
                        );
                    }
                },
                Message::Close(_) => {
                    tracing::info!(session_id = %session_id, "WebSocket close frame received");
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Axum handles ping/pong automatically
                }
                _ => {} // Ignore binary messages
            }
        }
    }

    // Cleanup on disconnect. No "left" notice goes to the room, and no
    // corrective typing signal is sent on behalf of the departed sender.
    tracing::info!(session_id = %session_id, "WebSocket connection closing");
    relay.remove_connection(&session_id).await;

    send_task.abort();
}

/// Handle client event
async fn handle_client_event(event: ClientEvent, conn: Arc<Connection>, relay: &RelayState) {
    use ClientEvent::*;

    match event {
        JoinRoom {
            room_id,
            user_name,
            is_staff,
        } => {
            // Staff always land in the shared staff room, whatever room
            // they asked for; guests register under the literal room_id
            let membership = if is_staff {
                STAFF_ROOM.to_string()
            } else {
                room_id.clone()
            };

            // A rejoin leaves the previous room first so one send can
            // never reach the same session twice
            if let Some(prev) = conn.replace_room(membership.clone()).await {
                relay.rooms.unsubscribe(&prev, &conn.session_id).await;
            }
            relay.rooms.subscribe(&membership, Arc::clone(&conn)).await;

            tracing::info!(
                session_id = %conn.session_id,
                room_id = %membership,
                user_name = %user_name,
                is_staff,
                "Joined room"
            );

            if !is_staff {
                // Staff observe every guest arrival in their own room
                let notice = ChatMessage::join_notice(&room_id, conn.session_id, &user_name);
                relay
                    .rooms
                    .broadcast(&room_id, ServerEvent::Message(notice.clone()))
                    .await;
                if room_id != STAFF_ROOM {
                    relay
                        .rooms
                        .broadcast(STAFF_ROOM, ServerEvent::Message(notice))
                        .await;
                }
            }

            // History backfill is scoped to the requested room_id, not the
            // membership room: a staff joiner gets the guest conversation
            // it asked for even though it now sits in the staff room
            let messages = match relay.store.recent_by_room(&room_id, relay.history_limit).await {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        room_id = %room_id,
                        "History fetch failed, joining with empty history"
                    );
                    Vec::new()
                }
            };
            let _ = conn.send(ServerEvent::MessageHistory { messages });
        }

        SendMessage {
            room_id,
            user_name,
            message,
            is_staff,
        } => {
            let msg = ChatMessage::new(
                room_id.clone(),
                Sender {
                    id: conn.session_id,
                    name: user_name,
                    is_staff,
                },
                message,
            );

            // Persistence is best-effort relative to delivery: hand it to
            // its own task so a slow or failing store never delays fan-out
            let store = relay.store.clone();
            let persist = msg.clone();
            tokio::spawn(async move {
                if let Err(e) = store.append(&persist).await {
                    tracing::error!(
                        error = ?e,
                        room_id = %persist.room_id,
                        "Failed to persist chat message"
                    );
                }
            });

            relay
                .rooms
                .broadcast(&room_id, ServerEvent::Message(msg.clone()))
                .await;

            // Mirror guest traffic to the staff room so staff see every
            // conversation regardless of which one they are viewing
            if room_id != STAFF_ROOM {
                relay
                    .rooms
                    .broadcast(STAFF_ROOM, ServerEvent::Message(msg))
                    .await;
            }
        }

        Typing {
            room_id,
            user_name,
            is_typing,
        } => {
            // Ephemeral: no persistence, no staff mirroring, and the
            // sender is excluded from its own signal
            relay
                .rooms
                .broadcast_except(
                    &room_id,
                    &conn.session_id,
                    ServerEvent::UserTyping {
                        user_name,
                        is_typing,
                    },
                )
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::MessageStore;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    /// Relay over a pool that never connects: history fetches degrade to
    /// empty batches and spawned persists fail quietly, exactly the
    /// storage-outage behavior the gateway must exhibit.
    fn test_relay() -> RelayState {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy("postgres://127.0.0.1:1/unreachable")
            .unwrap();
        RelayState::new(MessageStore::new(pool), 50, 16)
    }

    async fn join(
        relay: &RelayState,
        room_id: &str,
        user_name: &str,
        is_staff: bool,
    ) -> (Arc<Connection>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let conn = relay.add_connection(Connection::new(tx)).await;
        handle_client_event(
            ClientEvent::JoinRoom {
                room_id: room_id.to_string(),
                user_name: user_name.to_string(),
                is_staff,
            },
            Arc::clone(&conn),
            relay,
        )
        .await;
        (conn, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn message_bodies(events: &[ServerEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ServerEvent::Message(m) => Some(m.message.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_staff_join_is_redirected_to_staff_room() {
        let relay = test_relay();
        let (conn, mut rx) = join(&relay, "guest-173045", "Front Desk", true).await;

        assert_eq!(relay.rooms.member_count("guest-173045").await, 0);
        assert_eq!(relay.rooms.member_count(STAFF_ROOM).await, 1);
        assert_eq!(conn.current_room().await, Some(STAFF_ROOM.to_string()));

        // backfill still arrives (empty here, the store is unreachable),
        // scoped to the requested room rather than the staff room
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [ServerEvent::MessageHistory { messages }] if messages.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_guest_join_notice_reaches_room_and_staff() {
        let relay = test_relay();
        let (_staff, mut staff_rx) = join(&relay, "whatever", "Front Desk", true).await;
        drain(&mut staff_rx);

        let (_guest, mut guest_rx) = join(&relay, "guest-173045", "Dana", false).await;

        let guest_events = drain(&mut guest_rx);
        assert_eq!(message_bodies(&guest_events), vec!["Dana joined the chat"]);
        assert!(guest_events
            .iter()
            .any(|e| matches!(e, ServerEvent::MessageHistory { .. })));

        let staff_events = drain(&mut staff_rx);
        assert_eq!(message_bodies(&staff_events), vec!["Dana joined the chat"]);
    }

    #[tokio::test]
    async fn test_guest_send_fans_out_to_room_and_staff_exactly_once() {
        let relay = test_relay();
        let (_staff, mut staff_rx) = join(&relay, "ignored", "Front Desk", true).await;
        let (guest, mut guest_rx) = join(&relay, "guest-173045", "Dana", false).await;
        drain(&mut staff_rx);
        drain(&mut guest_rx);

        handle_client_event(
            ClientEvent::SendMessage {
                room_id: "guest-173045".to_string(),
                user_name: "Dana".to_string(),
                message: "Hello".to_string(),
                is_staff: false,
            },
            guest,
            &relay,
        )
        .await;

        // sender's own echo, exactly once
        assert_eq!(message_bodies(&drain(&mut guest_rx)), vec!["Hello"]);

        // staff copy carries the guest room id and sender name
        let staff_events = drain(&mut staff_rx);
        match staff_events.as_slice() {
            [ServerEvent::Message(m)] => {
                assert_eq!(m.room_id, "guest-173045");
                assert_eq!(m.sender.name, "Dana");
                assert!(!m.read);
                assert!(m.id.is_none());
            }
            other => panic!("expected one staff delivery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_staff_send_is_not_mirrored_twice() {
        let relay = test_relay();
        let (staff, mut staff_rx) = join(&relay, "ignored", "Front Desk", true).await;
        drain(&mut staff_rx);

        handle_client_event(
            ClientEvent::SendMessage {
                room_id: STAFF_ROOM.to_string(),
                user_name: "Front Desk".to_string(),
                message: "shift notes".to_string(),
                is_staff: true,
            },
            staff,
            &relay,
        )
        .await;

        assert_eq!(message_bodies(&drain(&mut staff_rx)), vec!["shift notes"]);
    }

    #[tokio::test]
    async fn test_rejoin_does_not_double_deliver() {
        let relay = test_relay();
        let (guest, mut guest_rx) = join(&relay, "guest-1", "Dana", false).await;

        // same connection joins again (client-side rejoin after a glitch)
        handle_client_event(
            ClientEvent::JoinRoom {
                room_id: "guest-1".to_string(),
                user_name: "Dana".to_string(),
                is_staff: false,
            },
            Arc::clone(&guest),
            &relay,
        )
        .await;
        drain(&mut guest_rx);
        assert_eq!(relay.rooms.member_count("guest-1").await, 1);

        let (peer, mut peer_rx) = join(&relay, "guest-1", "Alex", false).await;
        drain(&mut guest_rx);
        drain(&mut peer_rx);

        handle_client_event(
            ClientEvent::SendMessage {
                room_id: "guest-1".to_string(),
                user_name: "Alex".to_string(),
                message: "hi".to_string(),
                is_staff: false,
            },
            peer,
            &relay,
        )
        .await;

        assert_eq!(message_bodies(&drain(&mut guest_rx)), vec!["hi"]);
    }

    #[tokio::test]
    async fn test_typing_excludes_sender_and_staff() {
        let relay = test_relay();
        let (_staff, mut staff_rx) = join(&relay, "ignored", "Front Desk", true).await;
        let (guest, mut guest_rx) = join(&relay, "guest-1", "Dana", false).await;
        let (_peer, mut peer_rx) = join(&relay, "guest-1", "Alex", false).await;
        drain(&mut staff_rx);
        drain(&mut guest_rx);
        drain(&mut peer_rx);

        handle_client_event(
            ClientEvent::Typing {
                room_id: "guest-1".to_string(),
                user_name: "Dana".to_string(),
                is_typing: true,
            },
            guest,
            &relay,
        )
        .await;

        assert!(drain(&mut guest_rx).is_empty());
        assert!(drain(&mut staff_rx).is_empty());

        let peer_events = drain(&mut peer_rx);
        assert!(matches!(
            peer_events.as_slice(),
            [ServerEvent::UserTyping { user_name, is_typing: true }] if user_name == "Dana"
        ));
    }

    #[tokio::test]
    async fn test_send_before_join_is_tolerated() {
        let relay = test_relay();
        let (tx, _rx) = mpsc::channel(16);
        let conn = relay.add_connection(Connection::new(tx)).await;

        // never joined anything; broadcast goes to empty membership sets
        handle_client_event(
            ClientEvent::SendMessage {
                room_id: "guest-never-joined".to_string(),
                user_name: "Dana".to_string(),
                message: "anyone there?".to_string(),
                is_staff: false,
            },
            conn,
            &relay,
        )
        .await;

        assert_eq!(relay.rooms.member_count("guest-never-joined").await, 0);
    }
}
