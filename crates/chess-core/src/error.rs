//! Chess domain error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Invalid UCI move: {0}")]
    InvalidUci(String),

    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
}
