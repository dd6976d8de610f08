pub use shakmaty;

pub mod error;
pub mod game;

pub use error::GameError;
pub use game::{AppliedMove, Game, STARTING_FEN};
