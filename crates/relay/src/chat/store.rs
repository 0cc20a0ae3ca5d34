//! Durable message store
//!
//! Append-only persistence of chat messages over Postgres. The only
//! mutation beyond inserts is the bulk per-room read-flag update; there is
//! no update-by-id, no delete, and no pagination beyond "most recent N".

use harborview_shared::{ChatMessage, Sender, StorageError};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

/// Append-only message log, queryable by room
#[derive(Clone)]
pub struct MessageStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    room_id: String,
    sender_id: Uuid,
    sender_name: String,
    is_staff: bool,
    message: String,
    created_at: OffsetDateTime,
    read: bool,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: Some(row.id),
            room_id: row.room_id,
            sender: Sender {
                id: row.sender_id,
                name: row.sender_name,
                is_staff: row.is_staff,
            },
            message: row.message,
            timestamp: row.created_at,
            read: row.read,
        }
    }
}

impl MessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a message, assigning its durable identity.
    ///
    /// The caller's timestamp is stored as-is so the broadcast copy and the
    /// persisted row agree. Returns the persisted message, id included.
    pub async fn append(&self, msg: &ChatMessage) -> Result<ChatMessage, StorageError> {
        let row: MessageRow = sqlx::query_as(
            r#"
            INSERT INTO chat_messages (room_id, sender_id, sender_name, is_staff, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, room_id, sender_id, sender_name, is_staff, message, created_at, read
            "#,
        )
        .bind(&msg.room_id)
        .bind(msg.sender.id)
        .bind(&msg.sender.name)
        .bind(msg.sender.is_staff)
        .bind(&msg.message)
        .bind(msg.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// The `limit` most recently persisted messages for a room, returned
    /// oldest to newest (queried newest-first, then reversed).
    pub async fn recent_by_room(
        &self,
        room_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, StorageError> {
        let mut rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, room_id, sender_id, sender_name, is_staff, message, created_at, read
            FROM chat_messages
            WHERE room_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.reverse();
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Bulk-set read=true for every currently-unread message in a room.
    /// Returns the number of messages flipped. The flag never reverses.
    pub async fn mark_read(&self, room_id: &str) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "UPDATE chat_messages SET read = TRUE WHERE room_id = $1 AND read = FALSE",
        )
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_carries_durable_id() {
        let row = MessageRow {
            id: 7,
            room_id: "guest-1".to_string(),
            sender_id: Uuid::new_v4(),
            sender_name: "Dana".to_string(),
            is_staff: false,
            message: "Hello".to_string(),
            created_at: OffsetDateTime::now_utc(),
            read: false,
        };

        let msg: ChatMessage = row.into();
        assert_eq!(msg.id, Some(7));
        assert_eq!(msg.sender.name, "Dana");
        assert!(!msg.read);
    }
}
