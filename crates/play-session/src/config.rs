//! Session configuration from environment variables

use std::env;

use crate::error::SessionError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Path to the UCI engine binary
    pub engine_path: String,

    /// Default search depth for engine requests
    pub search_depth: u8,

    /// Default engine time budget per move in milliseconds
    pub move_time_ms: u32,

    /// Delay between an accepted human move and the engine request
    pub engine_settle_ms: u64,

    /// Ceiling for depth-only searches before the engine counts as gone
    pub engine_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables, with defaults matching
    /// an interactive session against a local Stockfish.
    pub fn load() -> Result<Self, SessionError> {
        let engine_path = env::var("STOCKFISH_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());

        let search_depth: u8 = env::var("SEARCH_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let move_time_ms: u32 = env::var("MOVE_TIME_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);

        let engine_settle_ms = env::var("ENGINE_SETTLE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(250);

        let engine_timeout_secs = env::var("ENGINE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        if search_depth == 0 {
            return Err(SessionError::Config("SEARCH_DEPTH must be at least 1"));
        }
        if move_time_ms == 0 {
            return Err(SessionError::Config("MOVE_TIME_MS must be at least 1"));
        }

        Ok(Self {
            engine_path,
            search_depth,
            move_time_ms,
            engine_settle_ms,
            engine_timeout_secs,
        })
    }
}
