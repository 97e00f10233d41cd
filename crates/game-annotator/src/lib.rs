//! Move annotation, mistake classification and plain-language explanations for
//! chess games, driven by an external UCI engine.

pub mod annotate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod hint;
pub mod pipeline;
pub mod score;
pub mod summary;
pub mod tactics;
pub mod uci;

pub use annotate::{annotate, MoveFacts};
pub use classify::{classify, Classification, Severity};
pub use config::AnnotatorConfig;
pub use engine::{evaluate, DepthProfile, Evaluation, SearchEngine, SearchInfo, SearchLimit, SearchUpdate};
pub use error::AnnotateError;
pub use explain::render;
pub use hint::{suggest_move, Hint};
pub use pipeline::{GamePipeline, MoveAnnotation, Progress};
pub use score::Score;
pub use summary::GameSummary;
pub use uci::UciEngine;
