//! Chat protocol event types and serialization
//!
//! Defines all client-to-server and server-to-client event types with
//! type-safe serde serialization. The transport boundary matches these
//! exhaustively; there is no string-keyed dispatch.

use harborview_shared::ChatMessage;
use serde::{Deserialize, Serialize};

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join a room. Staff membership is redirected to the staff room
    /// regardless of `room_id`.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        user_name: String,
        #[serde(default)]
        is_staff: bool,
    },

    /// Send a chat message to a room
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_id: String,
        user_name: String,
        message: String,
        #[serde(default)]
        is_staff: bool,
    },

    /// Typing indicator, relayed to the other members of the room
    #[serde(rename_all = "camelCase")]
    Typing {
        room_id: String,
        user_name: String,
        is_typing: bool,
    },
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A chat message (live broadcast); the durable id is present once known
    Message(ChatMessage),

    /// History backfill pushed once to a newly joined connection,
    /// oldest to newest
    MessageHistory { messages: Vec<ChatMessage> },

    /// Another member of the room started or stopped typing
    #[serde(rename_all = "camelCase")]
    UserTyping { user_name: String, is_typing: bool },
}
