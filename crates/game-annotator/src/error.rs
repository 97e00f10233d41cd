//! Annotator error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid move {mv}: {reason}")]
    InvalidMove { mv: String, reason: String },

    #[error("Chess error: {0}")]
    Chess(#[from] chess_core::ChessError),
}

impl AnnotateError {
    pub fn invalid_move(mv: impl ToString, reason: impl Into<String>) -> Self {
        AnnotateError::InvalidMove {
            mv: mv.to_string(),
            reason: reason.into(),
        }
    }
}
