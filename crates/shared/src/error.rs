//! Error types for the Harborview chat relay

use thiserror::Error;

/// Failure talking to the message store.
///
/// Persistence is best-effort relative to delivery: callers on the relay's
/// hot paths log these and carry on rather than propagating them as fatal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
