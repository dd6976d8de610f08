//! Rules errors

use shakmaty::Square;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Illegal move: {from}{to}")]
    IllegalMove { from: Square, to: Square },
}
