//! Turn controller: session state, engine backend and renderer wired into
//! the human-move / engine-reply round trip.

use std::time::Duration;

use shakmaty::{Color, Square};
use tracing::{debug, info, warn};

use crate::engine::{EngineReply, SearchBackend, SearchKind, SearchRequest};
use crate::error::SessionError;
use crate::render::BoardRenderer;
use crate::session::{GameSession, GameStatus, MoveRecord, Settings};

/// Outcome of one full round: the accepted human ply, the engine's answer
/// (absent when the human move ended the game), and the game status after.
#[derive(Debug, Clone)]
pub struct PlyReport {
    pub human: MoveRecord,
    pub engine: Option<MoveRecord>,
    pub status: GameStatus,
}

pub struct TurnController<E, R> {
    session: GameSession,
    engine: E,
    renderer: R,
    settle_delay: Duration,
    next_request_id: u64,
}

impl<E: SearchBackend, R: BoardRenderer> TurnController<E, R> {
    pub fn new(engine: E, mut renderer: R, settle_delay: Duration) -> Self {
        renderer.start();
        Self {
            session: GameSession::new(),
            engine,
            renderer,
            settle_delay,
            next_request_id: 0,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Validate and play a human move, then consult the engine for the
    /// answering ply. On engine failure the turn goes back to the human and
    /// the error is surfaced; the human's move stays on the board.
    pub async fn play_human_move(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<PlyReport, SessionError> {
        let (human, status) = self.session.attempt_human_move(from, to)?;
        info!(san = %human.san, "human move accepted");
        self.renderer.render(&self.session.fen());

        if status.is_over() {
            info!(?status, "game over");
            return Ok(PlyReport {
                human,
                engine: None,
                status,
            });
        }

        // Let the board settle before the engine starts churning output.
        tokio::time::sleep(self.settle_delay).await;

        let settings = self.session.settings();
        let reply = match self
            .consult_engine(SearchKind::Move, Some(settings.movetime_ms()))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                self.session.abort_engine_turn();
                return Err(e);
            }
        };

        let (engine_record, status) = match self.session.apply_engine_reply(&reply.uci) {
            Ok(applied) => applied,
            Err(e) => {
                self.session.abort_engine_turn();
                return Err(e);
            }
        };
        info!(san = %engine_record.san, "engine move applied");
        self.renderer.render(&self.session.fen());

        Ok(PlyReport {
            human,
            engine: Some(engine_record),
            status,
        })
    }

    /// One-shot engine suggestion for the current position. Does not touch
    /// history, position or turn state.
    pub async fn hint(&mut self) -> Result<String, SessionError> {
        if self.session.status().is_over() {
            return Err(SessionError::GameOver);
        }
        let reply = self.consult_engine(SearchKind::Hint, None).await?;
        Ok(reply.uci)
    }

    /// Issue a correlation-tagged search and check the reply's tag. A reply
    /// that does not match the outstanding request is discarded, never
    /// applied.
    async fn consult_engine(
        &mut self,
        kind: SearchKind,
        movetime_ms: Option<u32>,
    ) -> Result<EngineReply, SessionError> {
        self.next_request_id += 1;
        let req = SearchRequest {
            id: self.next_request_id,
            kind,
            fen: self.session.fen(),
            depth: self.session.settings().depth(),
            movetime_ms,
        };
        debug!(id = req.id, ?kind, fen = %req.fen, "engine request");

        let reply = self.engine.search(&req).await?;
        if reply.id != req.id || reply.kind != req.kind {
            warn!(
                want = req.id,
                got = reply.id,
                "discarding stale engine reply"
            );
            return Err(SessionError::Engine(format!(
                "Stale engine reply: request {} got reply {}",
                req.id, reply.id
            )));
        }
        Ok(reply)
    }

    /// Show the position after ply `n`; returns the truncated move list.
    pub fn jump_to_ply(&mut self, n: usize) -> Result<String, SessionError> {
        let fen = self.session.jump_to_ply(n)?;
        self.renderer.render(&fen);
        Ok(self.session.rendered_move_list())
    }

    pub fn jump_to_latest(&mut self) -> Result<String, SessionError> {
        let fen = self.session.jump_to_latest()?;
        self.renderer.render(&fen);
        Ok(self.session.rendered_move_list())
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.renderer.set_orientation(Color::White);
        self.renderer.start();
    }

    pub fn load_position(&mut self, fen: &str) -> Result<(), SessionError> {
        self.session.load_fen(fen)?;
        self.renderer.set_orientation(Color::White);
        self.renderer.render(&self.session.fen());
        Ok(())
    }

    pub fn flip_orientation(&mut self) {
        self.session.flip_orientation();
        self.renderer.flip();
        self.renderer.render(&self.session.fen());
    }

    pub fn update_settings(&mut self, depth: u8, movetime_ms: u32) -> Result<(), SessionError> {
        self.session.update_settings(depth, movetime_ms)
    }

    pub fn settings(&self) -> Settings {
        self.session.settings()
    }

    pub fn legal_targets(&self, square: Square) -> Vec<Square> {
        self.session.legal_targets(square)
    }

    /// Move records as pretty-printed JSON.
    pub fn export_history(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self.session.history())?)
    }

    /// Shut the engine down and hand it back.
    pub async fn shutdown(mut self) -> Result<(), SessionError> {
        self.engine.quit().await
    }
}
