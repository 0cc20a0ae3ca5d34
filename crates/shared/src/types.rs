//! Common types used across the Harborview chat relay

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Reserved identifier for the shared staff room.
///
/// Every staff connection is a member of this room regardless of which
/// guest conversation it is viewing. All guest traffic is mirrored here.
pub const STAFF_ROOM: &str = "staff-room";

/// The author of a chat message as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    /// Session id of the originating connection
    pub id: Uuid,
    /// Display name supplied by the client
    pub name: String,
    pub is_staff: bool,
}

/// A single chat message.
///
/// `id` is `None` until the message has been persisted; the store assigns
/// the durable identity. Everything except `read` is immutable once
/// persisted, and `read` only ever transitions false -> true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub room_id: String,
    pub sender: Sender,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub read: bool,
}

impl ChatMessage {
    /// Build a not-yet-persisted message stamped with the current time.
    pub fn new(room_id: impl Into<String>, sender: Sender, body: impl Into<String>) -> Self {
        Self {
            id: None,
            room_id: room_id.into(),
            sender,
            message: body.into(),
            timestamp: OffsetDateTime::now_utc(),
            read: false,
        }
    }

    /// The "<name> joined the chat" notice broadcast on guest joins.
    /// Never persisted, so it carries no durable id.
    pub fn join_notice(room_id: impl Into<String>, session_id: Uuid, user_name: &str) -> Self {
        Self::new(
            room_id,
            Sender {
                id: session_id,
                name: user_name.to_owned(),
                is_staff: false,
            },
            format!("{user_name} joined the chat"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Sender {
        Sender {
            id: Uuid::new_v4(),
            name: "Dana".to_string(),
            is_staff: false,
        }
    }

    #[test]
    fn test_message_wire_format_is_camel_case() {
        let msg = ChatMessage::new("guest-173045", sender(), "Hello");
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains(r#""roomId":"guest-173045""#));
        assert!(json.contains(r#""isStaff":false"#));
        assert!(json.contains(r#""read":false"#));
        // unpersisted messages must not leak a null id
        assert!(!json.contains(r#""id":null"#));
    }

    #[test]
    fn test_persisted_id_round_trips() {
        let mut msg = ChatMessage::new("guest-173045", sender(), "Hello");
        msg.id = Some(42);

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""id":42"#));

        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_join_notice_body() {
        let notice = ChatMessage::join_notice("guest-173045", Uuid::new_v4(), "Dana");
        assert_eq!(notice.message, "Dana joined the chat");
        assert_eq!(notice.room_id, "guest-173045");
        assert!(notice.id.is_none());
        assert!(!notice.sender.is_staff);
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let msg = ChatMessage::new("guest-1", sender(), "hi");
        let json = serde_json::to_value(&msg).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(OffsetDateTime::parse(ts, &time::format_description::well_known::Rfc3339).is_ok());
    }
}
