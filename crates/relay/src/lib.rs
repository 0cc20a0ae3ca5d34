//! Harborview Chat Relay
//!
//! This crate contains the live-support chat relay for the Harborview
//! hotel site: the WebSocket connection gateway, room registry, durable
//! message store, and the small HTTP surface the staff dashboard uses.

pub mod chat;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
