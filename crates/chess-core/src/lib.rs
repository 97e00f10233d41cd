//! Chess domain types, the rules-engine contract and PGN input.

pub use shakmaty;

pub mod error;
pub mod game_data;
pub mod pgn;
pub mod rules;
pub mod types;

pub use error::ChessError;
pub use rules::{AppliedMove, ChessRules, DrawReason, Rules};
pub use shakmaty::Square;
pub use types::{CastleSide, Piece, PieceKind, PlyMove, Side};
