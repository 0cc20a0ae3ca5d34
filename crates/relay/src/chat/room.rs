//! Room membership and fan-out
//!
//! Rooms are keyed by opaque caller-supplied strings: guest sessions mint
//! their own identifiers, and exactly one reserved literal denotes the
//! shared staff room. Rooms come into being on first subscribe; an entry
//! whose member set empties is reclaimed.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc::error::TrySendError, RwLock};
use uuid::Uuid;

use super::connection::Connection;
use super::events::ServerEvent;

/// Membership bookkeeping for all chat rooms.
///
/// No message content is interpreted here; the registry only tracks who is
/// in which room and fans events out to them. Identifier format and
/// uniqueness are not enforced.
pub struct RoomRegistry {
    /// Map of room_id -> current members
    rooms: RwLock<HashMap<String, Vec<Arc<Connection>>>>,
}

impl RoomRegistry {
    /// Create a new room registry
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to a room, creating the room if needed.
    ///
    /// A second subscribe for the same session replaces the first, so a
    /// connection is never a member of one room twice.
    pub async fn subscribe(&self, room_id: &str, conn: Arc<Connection>) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room_id.to_string()).or_default();
        members.retain(|c| c.session_id != conn.session_id);
        members.push(Arc::clone(&conn));

        tracing::debug!(
            room_id = %room_id,
            session_id = %conn.session_id,
            room_size = members.len(),
            "Connection joined room"
        );
    }

    /// Remove a connection from a room
    pub async fn unsubscribe(&self, room_id: &str, session_id: &Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room_id) {
            members.retain(|c| c.session_id != *session_id);

            // Reclaim empty rooms
            if members.is_empty() {
                rooms.remove(room_id);
                tracing::debug!(room_id = %room_id, "Removed empty room");
            } else {
                tracing::debug!(
                    room_id = %room_id,
                    session_id = %session_id,
                    room_size = members.len(),
                    "Connection left room"
                );
            }
        }
    }

    /// Broadcast an event to all current members of a room
    pub async fn broadcast(&self, room_id: &str, event: ServerEvent) {
        self.fan_out(room_id, None, event).await;
    }

    /// Broadcast an event to all members of a room except one session
    /// (typing signals are not echoed back to their sender)
    pub async fn broadcast_except(&self, room_id: &str, except: &Uuid, event: ServerEvent) {
        self.fan_out(room_id, Some(except), event).await;
    }

    async fn fan_out(&self, room_id: &str, except: Option<&Uuid>, event: ServerEvent) {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room_id) else {
            // Sends to unknown rooms are tolerated, not rejected
            tracing::debug!(room_id = %room_id, "Broadcast to room with no members");
            return;
        };

        let mut delivered = 0;
        for conn in members {
            if except.is_some_and(|id| conn.session_id == *id) {
                continue;
            }
            match conn.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        session_id = %conn.session_id,
                        room_id = %room_id,
                        "Outbound buffer full, dropping event for slow consumer"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(
                        session_id = %conn.session_id,
                        "Failed to send event to connection (likely closed)"
                    );
                }
            }
        }

        tracing::debug!(
            room_id = %room_id,
            recipients = delivered,
            room_size = members.len(),
            "Broadcast event to room"
        );
    }

    /// Number of connections currently in a room
    pub async fn member_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map(|v| v.len()).unwrap_or(0)
    }

    /// Total number of rooms with at least one member
    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
