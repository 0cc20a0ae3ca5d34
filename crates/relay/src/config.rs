//! Application configuration

use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub public_url: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Chat relay
    /// How many persisted messages a joining connection is backfilled with
    pub chat_history_limit: i64,
    /// Per-connection outbound buffer; events beyond this are dropped for
    /// that connection rather than letting a stalled client grow memory
    pub chat_outbound_buffer: usize,

    // CORS: origins the embedded widget and dashboard are served from
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Chat relay
            chat_history_limit: {
                let limit: i64 = env::var("CHAT_HISTORY_LIMIT")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .unwrap_or(50);
                if limit <= 0 {
                    return Err(ConfigError::Invalid(
                        "CHAT_HISTORY_LIMIT must be a positive integer",
                    ));
                }
                limit
            },
            chat_outbound_buffer: {
                let cap: usize = env::var("CHAT_OUTBOUND_BUFFER")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .unwrap_or(256);
                if cap == 0 {
                    return Err(ConfigError::Invalid(
                        "CHAT_OUTBOUND_BUFFER must be a positive integer",
                    ));
                }
                cap
            },

            // CORS
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration value: {0}")]
    Invalid(&'static str),
}
