//! Session state: move history, turn sequencing, settings, orientation.
//!
//! Everything here is synchronous and free of I/O so the state machine can
//! be unit tested without a renderer or a live engine. The controller layers
//! the async engine round trip on top.

use chess_core::Game;
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Square};

use crate::error::SessionError;

/// Who the session is waiting on.
///
/// Engine requests are only issued from `AwaitingHumanMove` after an accepted
/// human move, and the session returns to `AwaitingHumanMove` only once the
/// engine's move is applied (or the request failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingHumanMove,
    EngineThinking,
}

/// Result of probing the rules library after a ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    Drawn,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// Engine search parameters; both fields are kept at least 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settings {
    depth: u8,
    movetime_ms: u32,
}

impl Settings {
    pub fn new(depth: u8, movetime_ms: u32) -> Result<Self, SessionError> {
        if depth == 0 {
            return Err(SessionError::InvalidSettings("depth must be at least 1"));
        }
        if movetime_ms == 0 {
            return Err(SessionError::InvalidSettings(
                "move time must be at least 1ms",
            ));
        }
        Ok(Self { depth, movetime_ms })
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn movetime_ms(&self) -> u32 {
        self.movetime_ms
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            depth: 5,
            movetime_ms: 1000,
        }
    }
}

/// One recorded ply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    pub san: String,
    pub uci: String,
    /// Position after the move.
    pub fen: String,
}

/// The whole mutable session. Ply indices are 1-based; `view_ply` is the
/// number of plies currently displayed and equals `history.len()` when the
/// session is at the tip.
#[derive(Debug, Clone)]
pub struct GameSession {
    game: Game,
    history: Vec<MoveRecord>,
    state: TurnState,
    settings: Settings,
    orientation: Color,
    view_ply: usize,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            game: Game::new(),
            history: Vec::new(),
            state: TurnState::AwaitingHumanMove,
            settings: Settings::default(),
            orientation: Color::White,
            view_ply: 0,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn orientation(&self) -> Color {
        self.orientation
    }

    pub fn view_ply(&self) -> usize {
        self.view_ply
    }

    pub fn at_tip(&self) -> bool {
        self.view_ply == self.history.len()
    }

    /// FEN of the position currently displayed.
    pub fn fen(&self) -> String {
        self.game.fen()
    }

    pub fn status(&self) -> GameStatus {
        if self.game.is_checkmate() {
            GameStatus::Checkmate
        } else if self.game.is_stalemate() {
            GameStatus::Stalemate
        } else if self.game.is_game_over() {
            GameStatus::Drawn
        } else {
            GameStatus::Ongoing
        }
    }

    pub fn legal_targets(&self, square: Square) -> Vec<Square> {
        self.game.legal_targets(square)
    }

    /// Validate and apply a human move. The source square must hold a piece
    /// of the session's orientation color and the rules library must accept
    /// the move (queen promotion by default).
    ///
    /// If the session had been navigated backwards, acceptance discards the
    /// future tail first, so the new move branches from the viewed position.
    /// Rejection leaves history and position untouched.
    pub fn attempt_human_move(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<(MoveRecord, GameStatus), SessionError> {
        if self.state == TurnState::EngineThinking {
            return Err(SessionError::EngineBusy);
        }
        if self.status().is_over() {
            return Err(SessionError::GameOver);
        }
        if self.game.color_at(from) != Some(self.orientation) {
            return Err(SessionError::InvalidMove(format!("{from}{to}")));
        }

        let applied = self
            .game
            .apply_move(from, to)
            .map_err(|_| SessionError::InvalidMove(format!("{from}{to}")))?;

        self.history.truncate(self.view_ply);
        self.history.push(MoveRecord {
            san: applied.san,
            uci: applied.uci,
            fen: applied.fen,
        });
        self.view_ply = self.history.len();

        let status = self.status();
        if !status.is_over() {
            self.state = TurnState::EngineThinking;
        }
        Ok((self.history[self.view_ply - 1].clone(), status))
    }

    /// Apply the engine's best-move token. Only the square pair is consumed:
    /// a 5-character token's promotion letter is ignored and promotions are
    /// played as queen promotions (known limitation of this session layer).
    pub fn apply_engine_reply(
        &mut self,
        token: &str,
    ) -> Result<(MoveRecord, GameStatus), SessionError> {
        if self.state != TurnState::EngineThinking {
            return Err(SessionError::Engine(format!(
                "Unexpected engine move {token}"
            )));
        }
        let (from, to) = split_move_token(token)?;
        let applied = self
            .game
            .apply_move(from, to)
            .map_err(|_| SessionError::Engine(format!("Engine sent illegal move {token}")))?;

        self.history.push(MoveRecord {
            san: applied.san,
            uci: applied.uci,
            fen: applied.fen,
        });
        self.view_ply = self.history.len();
        self.state = TurnState::AwaitingHumanMove;
        Ok((self.history[self.view_ply - 1].clone(), self.status()))
    }

    /// Give the turn back to the human after a failed engine request.
    pub fn abort_engine_turn(&mut self) {
        self.state = TurnState::AwaitingHumanMove;
    }

    /// Restore the position after ply `n` (1-based) for display. The history
    /// itself is kept; the next accepted human move branches from here.
    /// Idempotent.
    pub fn jump_to_ply(&mut self, n: usize) -> Result<String, SessionError> {
        if self.state == TurnState::EngineThinking {
            return Err(SessionError::EngineBusy);
        }
        if n == 0 || n > self.history.len() {
            return Err(SessionError::UnknownPly(n));
        }
        let fen = self.history[n - 1].fen.clone();
        self.game = Game::from_fen(&fen).map_err(|_| SessionError::InvalidFen(fen.clone()))?;
        self.view_ply = n;
        Ok(fen)
    }

    /// Return to the newest recorded ply.
    pub fn jump_to_latest(&mut self) -> Result<String, SessionError> {
        if self.history.is_empty() {
            return Ok(self.fen());
        }
        self.jump_to_ply(self.history.len())
    }

    /// Clear history, restore the standard initial position, white
    /// orientation and the human's turn. Settings survive the reset.
    pub fn reset(&mut self) {
        self.game.reset();
        self.history.clear();
        self.view_ply = 0;
        self.state = TurnState::AwaitingHumanMove;
        self.orientation = Color::White;
    }

    /// Reseed the session from a FEN string. Invalid input leaves every part
    /// of the session unchanged.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), SessionError> {
        let game = Game::from_fen(fen).map_err(|_| SessionError::InvalidFen(fen.to_string()))?;
        self.game = game;
        self.history.clear();
        self.view_ply = 0;
        self.state = TurnState::AwaitingHumanMove;
        self.orientation = Color::White;
        Ok(())
    }

    /// Toggle which side the human plays. Does not touch the turn state or
    /// whose move it logically is.
    pub fn flip_orientation(&mut self) {
        self.orientation = !self.orientation;
    }

    pub fn update_settings(&mut self, depth: u8, movetime_ms: u32) -> Result<(), SessionError> {
        self.settings = Settings::new(depth, movetime_ms)?;
        Ok(())
    }

    /// Textual move list up to the viewed ply, numbered by full move:
    /// `1. e4 e5 - 2. Nf3 ...`
    pub fn rendered_move_list(&self) -> String {
        let mut out = String::new();
        for (i, record) in self.history[..self.view_ply].iter().enumerate() {
            if i % 2 == 0 {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&format!("{}. {}", i / 2 + 1, record.san));
            } else {
                out.push_str(&format!(" {} -", record.san));
            }
        }
        out
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an engine move token into its square pair, dropping any promotion
/// letter.
fn split_move_token(token: &str) -> Result<(Square, Square), SessionError> {
    if !token.is_ascii() || (token.len() != 4 && token.len() != 5) {
        return Err(SessionError::Engine(format!("Bad move token {token}")));
    }
    let from = token[0..2]
        .parse::<Square>()
        .map_err(|_| SessionError::Engine(format!("Bad move token {token}")))?;
    let to = token[2..4]
        .parse::<Square>()
        .map_err(|_| SessionError::Engine(format!("Bad move token {token}")))?;
    Ok((from, to))
}
