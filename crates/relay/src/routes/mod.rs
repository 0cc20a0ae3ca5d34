//! HTTP routes

pub mod chat;
pub mod health;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{chat::ws_handler, state::AppState};

/// Create all routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Dashboard API routes - under /api/v1
    let api_v1_routes = Router::new()
        .route("/chat/rooms/:room_id/messages", get(chat::room_messages))
        .route("/chat/rooms/:room_id/read", post(chat::mark_room_read))
        .route("/chat/stats", get(chat::stats));

    // WebSocket route (anonymous; staff auth happens upstream)
    let websocket_routes = Router::new().route("/ws/chat", get(ws_handler));

    // The widget is embedded in hotel pages served from other origins
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .merge(health_routes)
        .merge(websocket_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
