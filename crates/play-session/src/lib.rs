pub use chess_core;

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod render;
pub mod session;

pub use config::AppConfig;
pub use controller::{PlyReport, TurnController};
pub use engine::{EngineReply, ProcessEngine, SearchBackend, SearchKind, SearchRequest};
pub use error::SessionError;
pub use render::{BoardRenderer, TextBoard};
pub use session::{GameSession, GameStatus, MoveRecord, Settings, TurnState};
