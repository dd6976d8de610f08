//! Thin rules layer over shakmaty: legality, move application, FEN round-trips.
//!
//! Moves come in as square pairs (the way a board front end reports a drag),
//! so castling is matched by the king's destination square and pawn promotion
//! defaults to queen. Underpromotion is deliberately not reachable through
//! this interface.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, Move, Position, Role, Square,
};

use crate::error::GameError;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One applied ply: SAN and UCI forms plus the resulting position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedMove {
    pub san: String,
    pub uci: String,
    pub fen: String,
}

/// Full game state as seen by the rules library.
#[derive(Debug, Clone)]
pub struct Game {
    pos: Chess,
}

impl Game {
    /// Standard initial position.
    pub fn new() -> Self {
        Self {
            pos: Chess::default(),
        }
    }

    /// Parse a FEN string into a playable position.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|_| GameError::InvalidFen(fen.to_string()))?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|_| GameError::InvalidFen(fen.to_string()))?;
        Ok(Self { pos })
    }

    /// Export the current position as FEN.
    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    /// Color of the piece on `square`, if any.
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.pos.board().piece_at(square).map(|p| p.color)
    }

    /// Destination squares legal from `square`. Castling shows up as the
    /// king's two-file destination, matching what a board widget highlights.
    pub fn legal_targets(&self, square: Square) -> Vec<Square> {
        let mut targets = Vec::new();
        for m in &self.pos.legal_moves() {
            if let Some((from, to)) = drag_squares(m) {
                if from == square {
                    targets.push(to);
                }
            }
        }
        targets
    }

    /// Apply the move from `from` to `to` if legal, promoting to queen when
    /// the move is a pawn promotion. Returns the SAN/UCI forms and the
    /// resulting FEN.
    pub fn apply_move(&mut self, from: Square, to: Square) -> Result<AppliedMove, GameError> {
        let m = self
            .find_move(from, to)
            .ok_or(GameError::IllegalMove { from, to })?;
        // SanPlus carries the check/mate suffix, matching what a move list
        // displays.
        let san = SanPlus::from_move(self.pos.clone(), m.clone()).to_string();
        let uci = match &m {
            Move::Normal {
                promotion: Some(_), ..
            } => format!("{from}{to}q"),
            _ => format!("{from}{to}"),
        };
        self.pos.play_unchecked(m);
        Ok(AppliedMove {
            san,
            uci,
            fen: self.fen(),
        })
    }

    /// Find the legal move matching a drag from `from` to `to`. Of the four
    /// promotion choices only the queen is ever selected.
    fn find_move(&self, from: Square, to: Square) -> Option<Move> {
        for m in &self.pos.legal_moves() {
            let (m_from, m_to) = match drag_squares(m) {
                Some(pair) => pair,
                None => continue,
            };
            if m_from != from || m_to != to {
                continue;
            }
            match m {
                Move::Normal {
                    promotion: Some(role),
                    ..
                } if *role != Role::Queen => continue,
                _ => return Some(m.clone()),
            }
        }
        None
    }

    pub fn is_game_over(&self) -> bool {
        self.pos.is_game_over()
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.pos.is_stalemate()
    }

    pub fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    /// Back to the standard initial position.
    pub fn reset(&mut self) {
        self.pos = Chess::default();
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// The square pair a board front end would report for this move. Castling
/// maps to the king's destination file (g or c); drops don't occur in
/// standard chess.
fn drag_squares(m: &Move) -> Option<(Square, Square)> {
    match m {
        Move::Normal { from, to, .. } => Some((*from, *to)),
        Move::EnPassant { from, to } => Some((*from, *to)),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            Some((*king, Square::from_coords(file, king.rank())))
        }
        Move::Put { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_starting_fen_roundtrip() {
        let game = Game::new();
        assert_eq!(game.fen(), STARTING_FEN);
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn test_apply_opening_move() {
        let mut game = Game::new();
        let applied = game.apply_move(sq("e2"), sq("e4")).unwrap();
        assert_eq!(applied.san, "e4");
        assert_eq!(applied.uci, "e2e4");
        assert_eq!(game.turn(), Color::Black);
        assert!(applied.fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
    }

    #[test]
    fn test_illegal_move_rejected_without_mutation() {
        let mut game = Game::new();
        let before = game.fen();
        assert!(matches!(
            game.apply_move(sq("e2"), sq("e5")),
            Err(GameError::IllegalMove { .. })
        ));
        assert_eq!(game.fen(), before);
    }

    #[test]
    fn test_empty_square_has_no_color() {
        let game = Game::new();
        assert_eq!(game.color_at(sq("e4")), None);
        assert_eq!(game.color_at(sq("e2")), Some(Color::White));
        assert_eq!(game.color_at(sq("e7")), Some(Color::Black));
    }

    #[test]
    fn test_legal_targets_for_knight() {
        let game = Game::new();
        let mut targets = game.legal_targets(sq("g1"));
        targets.sort();
        assert_eq!(targets, vec![sq("f3"), sq("h3")]);
    }

    #[test]
    fn test_castle_by_king_drag() {
        // After 1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5, white can castle short.
        let mut game = Game::new();
        for (f, t) in [
            ("e2", "e4"),
            ("e7", "e5"),
            ("g1", "f3"),
            ("b8", "c6"),
            ("f1", "c4"),
            ("f8", "c5"),
        ] {
            game.apply_move(sq(f), sq(t)).unwrap();
        }
        let applied = game.apply_move(sq("e1"), sq("g1")).unwrap();
        assert_eq!(applied.san, "O-O");
        assert_eq!(applied.uci, "e1g1");
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut game = Game::from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let applied = game.apply_move(sq("e7"), sq("e8")).unwrap();
        assert_eq!(applied.san, "e8=Q");
        assert_eq!(applied.uci, "e7e8q");
    }

    #[test]
    fn test_invalid_fen_rejected() {
        assert!(matches!(
            Game::from_fen("not a position"),
            Err(GameError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let mut game = Game::new();
        let mut last = None;
        for (f, t) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            last = Some(game.apply_move(sq(f), sq(t)).unwrap());
        }
        assert_eq!(last.unwrap().san, "Qh4#");
        assert!(game.is_check());
        assert!(game.is_checkmate());
        assert!(game.is_game_over());
    }
}
