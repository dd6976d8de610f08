use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use play_session::chess_core::STARTING_FEN;
use play_session::{
    BoardRenderer, EngineReply, SearchBackend, SearchRequest, SessionError, TurnController,
};
use shakmaty::{Color, Square};

pub fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

/// Engine double that answers from a fixed script instead of a process.
pub struct ScriptedEngine {
    replies: VecDeque<ScriptedReply>,
}

pub enum ScriptedReply {
    /// Echo the request's tag with this move token.
    Move(&'static str),
    /// Reply with a token but a mismatched correlation id, as if a previous
    /// request's answer arrived late.
    Stale(&'static str),
    /// Simulate a crashed engine that never answers.
    Timeout,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: replies.into(),
        }
    }
}

#[async_trait]
impl SearchBackend for ScriptedEngine {
    async fn search(&mut self, req: &SearchRequest) -> Result<EngineReply, SessionError> {
        match self.replies.pop_front() {
            Some(ScriptedReply::Move(uci)) => Ok(EngineReply {
                id: req.id,
                kind: req.kind,
                uci: uci.to_string(),
            }),
            Some(ScriptedReply::Stale(uci)) => Ok(EngineReply {
                id: req.id + 1000,
                kind: req.kind,
                uci: uci.to_string(),
            }),
            Some(ScriptedReply::Timeout) => {
                Err(SessionError::EngineUnresponsive(Duration::from_secs(1)))
            }
            None => Err(SessionError::Engine("script exhausted".into())),
        }
    }

    async fn quit(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Renderer double that records what it was told to display.
#[derive(Default)]
pub struct RecordingRenderer {
    pub rendered: Vec<String>,
    pub orientation: Option<Color>,
    pub flips: usize,
}

impl BoardRenderer for RecordingRenderer {
    fn start(&mut self) {
        self.rendered.push(STARTING_FEN.to_string());
    }

    fn render(&mut self, fen: &str) {
        self.rendered.push(fen.to_string());
    }

    fn set_orientation(&mut self, color: Color) {
        self.orientation = Some(color);
    }

    fn flip(&mut self) {
        self.flips += 1;
    }
}

/// Controller with no settle delay, ready for scripted play.
pub fn controller(
    replies: Vec<ScriptedReply>,
) -> TurnController<ScriptedEngine, RecordingRenderer> {
    TurnController::new(
        ScriptedEngine::new(replies),
        RecordingRenderer::default(),
        Duration::ZERO,
    )
}
