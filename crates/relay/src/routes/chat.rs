//! Chat endpoints for the staff dashboard
//!
//! The live path is the WebSocket; these cover what the dashboard needs
//! over plain HTTP: a room's recent history, the bulk read-receipt
//! update, and relay statistics.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use harborview_shared::ChatMessage;
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RoomMessagesQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct RoomMessagesResponse {
    pub messages: Vec<ChatMessage>,
}

/// Recent messages for a room, oldest to newest — the same window a
/// joining connection is backfilled with
pub async fn room_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<RoomMessagesQuery>,
) -> ApiResult<Json<RoomMessagesResponse>> {
    let limit = query
        .limit
        .unwrap_or(state.config.chat_history_limit)
        .clamp(1, 200);

    let messages = state.relay.store.recent_by_room(&room_id, limit).await?;
    Ok(Json(RoomMessagesResponse { messages }))
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Bulk mark-read for a room (read receipts on the dashboard)
pub async fn mark_room_read(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = state.relay.store.mark_read(&room_id).await?;

    tracing::info!(room_id = %room_id, updated, "Marked room messages read");
    Ok(Json(MarkReadResponse { updated }))
}

#[derive(Serialize)]
pub struct RelayStatsResponse {
    pub active_connections: usize,
    pub active_rooms: usize,
}

/// Active connection and room counts
pub async fn stats(State(state): State<AppState>) -> Json<RelayStatsResponse> {
    let stats = state.relay.stats().await;
    Json(RelayStatsResponse {
        active_connections: stats.active_connections,
        active_rooms: stats.active_rooms,
    })
}
