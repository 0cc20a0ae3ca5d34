//! Chat connection management
//!
//! Represents an active WebSocket connection with its room membership.

use tokio::sync::{
    mpsc::{self, error::TrySendError},
    RwLock,
};
use uuid::Uuid;

use super::events::ServerEvent;

/// Represents an active chat connection.
///
/// A connection is a member of at most one room at a time: its guest room,
/// or the staff room for staff sessions.
#[derive(Debug)]
pub struct Connection {
    /// Unique session ID for this connection
    pub session_id: Uuid,

    /// Bounded channel to send events to this connection. When the buffer
    /// is full the event is dropped for this connection (slow consumer).
    sender: mpsc::Sender<ServerEvent>,

    /// The room this connection currently belongs to
    room: RwLock<Option<String>>,
}

impl Connection {
    /// Create a new connection
    pub fn new(sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            sender,
            room: RwLock::new(None),
        }
    }

    /// Send an event to this connection
    ///
    /// Returns Err(Full) when the outbound buffer is saturated and
    /// Err(Closed) once the connection has gone away.
    pub fn send(&self, event: ServerEvent) -> Result<(), TrySendError<ServerEvent>> {
        self.sender.try_send(event)
    }

    /// Record the room this connection now belongs to, returning the
    /// previous one (a rejoin must leave it first).
    pub async fn replace_room(&self, room_id: String) -> Option<String> {
        self.room.write().await.replace(room_id)
    }

    /// Clear and return the current room membership
    pub async fn take_room(&self) -> Option<String> {
        self.room.write().await.take()
    }

    /// The room this connection currently belongs to
    pub async fn current_room(&self) -> Option<String> {
        self.room.read().await.clone()
    }
}
