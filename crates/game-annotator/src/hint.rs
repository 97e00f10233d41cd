//! Live move hints at the shallower hint depth

use chess_core::{ChessRules, PlyMove, Rules};
use serde::Serialize;
use tracing::info;

use crate::annotate::annotate;
use crate::engine::{evaluate, DepthProfile, SearchEngine};
use crate::error::AnnotateError;
use crate::explain::render;
use crate::pipeline::MoveAnnotation;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hint {
    pub best_move: Option<PlyMove>,
    pub san: Option<String>,
    /// White-relative centipawns
    pub evaluation: i32,
    pub depth: u32,
    pub timed_out: bool,
    pub explanation: String,
}

/// Ask the engine for the best move in `fen` and explain it.
pub async fn suggest_move<E>(
    engine: &mut E,
    fen: &str,
    profile: DepthProfile,
) -> Result<Hint, AnnotateError>
where
    E: SearchEngine + ?Sized,
{
    let mut rules = ChessRules::from_fen(fen)?;
    let side_to_move = rules.current_turn();

    let evaluation = evaluate(engine, fen, profile).await?;
    let score = evaluation.score.white_pov(side_to_move);

    let Some(best) = evaluation.best_move else {
        return Ok(Hint {
            best_move: None,
            san: None,
            evaluation: score,
            depth: evaluation.depth,
            timed_out: evaluation.timed_out,
            explanation: "There are no legal moves in this position.".to_string(),
        });
    };

    let facts = annotate(&mut rules, &best)?;
    let san = rules.san(&best);
    let applied = rules
        .apply_move(&best)
        .ok_or_else(|| AnnotateError::invalid_move(best, "engine suggested an illegal move"))?;

    // The line after the suggested move itself
    let continuation = evaluation.pv.iter().skip(1).copied().collect();
    let annotation = MoveAnnotation {
        ply: 1,
        fen: applied.fen,
        mover: Some(side_to_move),
        played: Some(best),
        san: san.clone(),
        facts: Some(facts),
        analyzed: true,
        evaluation: score,
        depth: evaluation.depth,
        timed_out: evaluation.timed_out,
        principal_variation: continuation,
        comment: "Suggested move",
        ..MoveAnnotation::default()
    };

    info!(fen, best = %best, depth = evaluation.depth, "Hint ready");

    Ok(Hint {
        best_move: Some(best),
        san,
        evaluation: score,
        depth: evaluation.depth,
        timed_out: evaluation.timed_out,
        explanation: render(&annotation),
    })
}
