//! Relay-wide state
//!
//! Everything shared across chat connections: the connection table, the
//! room registry, and the message store. Constructed once at process start
//! and passed by reference into every handler; there is no global.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::connection::Connection;
use super::room::RoomRegistry;
use super::store::MessageStore;

/// Relay state shared across all chat connections
#[derive(Clone)]
pub struct RelayState {
    /// All active connections indexed by session_id
    connections: Arc<RwLock<HashMap<Uuid, Arc<Connection>>>>,

    /// Room membership and fan-out
    pub rooms: Arc<RoomRegistry>,

    /// Durable message log
    pub store: MessageStore,

    /// History backfill window pushed on join
    pub history_limit: i64,

    /// Capacity of each connection's outbound buffer
    pub outbound_buffer: usize,
}

impl RelayState {
    pub fn new(store: MessageStore, history_limit: i64, outbound_buffer: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RoomRegistry::new()),
            store,
            history_limit,
            outbound_buffer,
        }
    }

    /// Add a connection
    pub async fn add_connection(&self, conn: Connection) -> Arc<Connection> {
        let conn = Arc::new(conn);
        let mut connections = self.connections.write().await;
        connections.insert(conn.session_id, Arc::clone(&conn));

        tracing::info!(
            session_id = %conn.session_id,
            total_connections = connections.len(),
            "Chat connection added"
        );

        conn
    }

    /// Remove a connection and its room membership.
    ///
    /// No "left" notice is emitted to the room; join and disconnect are
    /// deliberately asymmetric.
    pub async fn remove_connection(&self, session_id: &Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections.remove(session_id) {
            if let Some(room_id) = conn.take_room().await {
                self.rooms.unsubscribe(&room_id, session_id).await;
            }

            tracing::info!(
                session_id = %session_id,
                remaining_connections = connections.len(),
                "Chat connection removed"
            );
        }
    }

    /// Get total number of active connections
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    /// Get statistics about the relay
    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            active_connections: self.connection_count().await,
            active_rooms: self.rooms.room_count().await,
        }
    }
}

/// Statistics about the chat relay
#[derive(Debug, Clone)]
pub struct RelayStats {
    /// Number of active connections
    pub active_connections: usize,
    /// Number of rooms with at least one member
    pub active_rooms: usize,
}
