//! Session error types

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine did not reply within {0:?}")]
    EngineUnresponsive(Duration),

    #[error("Engine is already thinking")]
    EngineBusy,

    #[error("Illegal move: {0}")]
    InvalidMove(String),

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Game is over")]
    GameOver,

    #[error("No recorded ply {0}")]
    UnknownPly(usize),

    #[error("Invalid settings: {0}")]
    InvalidSettings(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
