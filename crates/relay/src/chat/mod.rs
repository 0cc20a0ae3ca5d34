//! Live-support chat relay
//!
//! Connects anonymous guest widget sessions to the shared staff roster:
//! - Room-scoped fan-out with a reserved staff room mirroring all guest traffic
//! - Durable message history with join-time backfill
//! - Ephemeral typing signals (never persisted)
//!
//! # Architecture
//!
//! - **Connection**: one active WebSocket session with its outbound buffer
//! - **RoomRegistry**: membership bookkeeping and fan-out per room
//! - **MessageStore**: append-only persistence over Postgres
//! - **RelayState**: relay-wide state shared across all connections
//! - **Handler**: Axum WebSocket route handler dispatching protocol events
//! - **Events**: closed tagged-enum protocol, matched exhaustively

pub mod connection;
pub mod events;
pub mod handler;
pub mod room;
pub mod state;
pub mod store;

pub use handler::ws_handler;
pub use state::RelayState;
