//! Game annotation pipeline: replay a game, evaluate every position once and
//! build one immutable annotation per ply.

use chess_core::{ChessRules, PlyMove, Rules, Side};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::annotate::{annotate, MoveFacts};
use crate::classify::{classify, Severity};
use crate::engine::{evaluate, DepthProfile, SearchEngine};
use crate::error::AnnotateError;
use crate::explain::{render, Advantage};
use crate::summary::{format_report, GameSummary};

/// Evaluation swing, in centipawns, that makes a ply a key moment on its own
const KEY_MOMENT_SWING: i32 = 100;

/// Everything known about one position of the game. Index 0 is the starting position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoveAnnotation {
    pub ply: usize,
    /// Position after the move
    pub fen: String,
    pub move_number: u32,
    pub mover: Option<Side>,
    pub played: Option<PlyMove>,
    pub san: Option<String>,
    pub facts: Option<MoveFacts>,
    /// False for the starting position and for plies that could not be annotated
    pub analyzed: bool,
    /// White-relative centipawns; mate scores use the folded encoding
    pub evaluation: i32,
    /// Swing from the last analyzed evaluation; `None` until one exists
    pub evaluation_change: Option<i32>,
    pub depth: u32,
    pub timed_out: bool,
    /// Engine's best move in the position before this ply
    pub recommended: Option<PlyMove>,
    /// Engine's best line from this position
    pub principal_variation: Vec<PlyMove>,
    pub severity: Severity,
    pub comment: &'static str,
    pub cp_loss: i32,
}

impl MoveAnnotation {
    fn initial(fen: String, move_number: u32) -> Self {
        Self {
            fen,
            move_number,
            comment: "Starting position",
            ..Self::default()
        }
    }

    /// "Move 3. Bb5", "Move 2... Nc6" or "Starting position"
    pub fn label(&self) -> String {
        match (&self.san, self.mover) {
            (Some(san), Some(Side::White)) => format!("Move {}. {san}", self.move_number),
            (Some(san), Some(Side::Black)) => format!("Move {}... {san}", self.move_number),
            _ => "Starting position".to_string(),
        }
    }

    /// A mistake or worse, or an evaluation swing of more than a pawn
    pub fn is_key_moment(&self) -> bool {
        self.analyzed
            && (self.severity >= Severity::Mistake
                || self
                    .evaluation_change
                    .is_some_and(|change| change.abs() > KEY_MOMENT_SWING))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// One game's analysis run. Owns its engine and rules instance for its lifetime;
/// a new game needs a new pipeline.
pub struct GamePipeline<E, R> {
    engine: E,
    rules: R,
    profile: DepthProfile,
    moves: Vec<PlyMove>,
    /// Position `i` is the position after ply `i`
    fens: Vec<String>,
    sans: Vec<String>,
    movers: Vec<Side>,
    move_numbers: Vec<u32>,
    annotations: Vec<MoveAnnotation>,
    key_moments: Vec<usize>,
    /// Evaluation of the last analyzed position; the starting position is never searched
    last_evaluation: Option<i32>,
    /// Engine's best move in the current position, if it was evaluated
    recommendation: Option<PlyMove>,
    cursor: usize,
}

impl<E: SearchEngine, R: Rules> GamePipeline<E, R> {
    /// Replay `tokens` (UCI or SAN) from the current position of `rules`.
    ///
    /// Every move is validated up front; the first illegal one is an error.
    pub fn new<S: AsRef<str>>(
        engine: E,
        mut rules: R,
        tokens: &[S],
        profile: DepthProfile,
    ) -> Result<Self, AnnotateError> {
        let start_fen = rules.to_fen();
        let mut moves = Vec::with_capacity(tokens.len());
        let mut fens = vec![start_fen.clone()];
        let mut sans = Vec::with_capacity(tokens.len());
        let mut movers = Vec::with_capacity(tokens.len());
        let mut move_numbers = Vec::with_capacity(tokens.len());

        for token in tokens {
            let token = token.as_ref();
            let mv = rules.resolve(token).ok_or_else(|| {
                AnnotateError::invalid_move(token, format!("illegal after {} plies", moves.len()))
            })?;

            let san = rules.san(&mv).unwrap_or_else(|| mv.to_string());
            movers.push(rules.current_turn());
            move_numbers.push(fullmove_number(&rules.to_fen()));
            let applied = rules
                .apply_move(&mv)
                .ok_or_else(|| AnnotateError::invalid_move(token, "rejected by rules engine"))?;

            moves.push(mv);
            sans.push(san);
            fens.push(applied.fen);
        }

        for _ in 0..moves.len() {
            rules.undo();
        }

        info!(plies = moves.len(), fen = %start_fen, "Game replayed");

        let initial = MoveAnnotation::initial(start_fen.clone(), fullmove_number(&start_fen));
        Ok(Self {
            engine,
            rules,
            profile,
            moves,
            fens,
            sans,
            movers,
            move_numbers,
            annotations: vec![initial],
            key_moments: Vec::new(),
            last_evaluation: None,
            recommendation: None,
            cursor: 0,
        })
    }

    /// Number of positions, including the starting position
    pub fn total_positions(&self) -> usize {
        self.moves.len() + 1
    }

    pub fn is_complete(&self) -> bool {
        self.annotations.len() == self.total_positions()
    }

    /// Annotate the next ply. Returns `None` once every position is annotated.
    pub async fn step(&mut self) -> Result<Option<&MoveAnnotation>, AnnotateError> {
        let ply = self.annotations.len();
        if ply > self.moves.len() {
            return Ok(None);
        }
        let mv = self.moves[ply - 1];

        let annotation = match annotate(&mut self.rules, &mv) {
            Ok(facts) => self.analyze_ply(ply, mv, facts).await?,
            Err(e) => {
                warn!(ply, mv = %mv, error = %e, "Position not analyzed");
                self.placeholder(ply, mv)
            }
        };

        self.rules
            .apply_move(&mv)
            .ok_or_else(|| AnnotateError::invalid_move(mv, "illegal in this position"))?;

        if annotation.is_key_moment() {
            self.key_moments.push(ply);
        }
        debug!(
            ply,
            severity = annotation.severity.label(),
            evaluation = annotation.evaluation,
            depth = annotation.depth,
            "Annotated ply"
        );
        self.annotations.push(annotation);
        Ok(self.annotations.last())
    }

    /// Step until every position is annotated
    pub async fn run(&mut self, mut progress: impl FnMut(Progress)) -> Result<(), AnnotateError> {
        let total = self.total_positions();
        info!(total, "Starting game annotation");

        progress(Progress {
            current: self.annotations.len(),
            total,
        });
        while self.step().await?.is_some() {
            progress(Progress {
                current: self.annotations.len(),
                total,
            });
        }

        info!(key_moments = self.key_moments.len(), "Game annotation complete");
        Ok(())
    }

    async fn analyze_ply(
        &mut self,
        ply: usize,
        mv: PlyMove,
        facts: MoveFacts,
    ) -> Result<MoveAnnotation, AnnotateError> {
        let fen = self.fens[ply].clone();
        let mover = self.movers[ply - 1];

        let evaluation = evaluate(&mut self.engine, &fen, self.profile).await?;
        let score = evaluation.score.white_pov(mover.opponent());

        let recommended = self.recommendation.take();
        let classification = classify(
            self.last_evaluation.unwrap_or(score),
            recommended.as_ref(),
            Some(&mv),
            score,
            mover,
        );
        let evaluation_change = self.last_evaluation.map(|before| score - before);

        self.last_evaluation = Some(score);
        self.recommendation = evaluation.best_move;

        Ok(MoveAnnotation {
            ply,
            fen,
            move_number: self.move_numbers[ply - 1],
            mover: Some(mover),
            played: Some(mv),
            san: Some(self.sans[ply - 1].clone()),
            facts: Some(facts),
            analyzed: true,
            evaluation: score,
            evaluation_change,
            depth: evaluation.depth,
            timed_out: evaluation.timed_out,
            recommended,
            principal_variation: evaluation.pv,
            severity: classification.severity,
            comment: classification.comment,
            cp_loss: classification.cp_loss,
        })
    }

    /// Stand-in for a ply whose move could not be annotated; the last evaluation carries over
    fn placeholder(&mut self, ply: usize, mv: PlyMove) -> MoveAnnotation {
        self.recommendation = None;
        MoveAnnotation {
            ply,
            fen: self.fens[ply].clone(),
            move_number: self.move_numbers[ply - 1],
            mover: Some(self.movers[ply - 1]),
            played: Some(mv),
            san: Some(self.sans[ply - 1].clone()),
            evaluation: self.last_evaluation.unwrap_or_default(),
            comment: "Position not analyzed",
            ..MoveAnnotation::default()
        }
    }

    pub fn annotations(&self) -> &[MoveAnnotation] {
        &self.annotations
    }

    /// Ply indices flagged as key moments, in order
    pub fn key_moments(&self) -> &[usize] {
        &self.key_moments
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary::from_annotations(&self.annotations)
    }

    pub fn position(&self, index: usize) -> Option<&MoveAnnotation> {
        self.annotations.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn navigate_to(&mut self, index: usize) -> Option<&MoveAnnotation> {
        if index >= self.annotations.len() {
            return None;
        }
        self.cursor = index;
        self.annotations.get(index)
    }

    pub fn next_position(&mut self) -> Option<&MoveAnnotation> {
        self.navigate_to(self.cursor + 1)
    }

    pub fn previous_position(&mut self) -> Option<&MoveAnnotation> {
        let index = self.cursor.checked_sub(1)?;
        self.navigate_to(index)
    }

    pub fn next_key_moment(&mut self) -> Option<&MoveAnnotation> {
        let index = self
            .key_moments
            .iter()
            .copied()
            .find(|&index| index > self.cursor)?;
        self.navigate_to(index)
    }

    /// Full explanation for one position: label, evaluation, move quality and the
    /// rendered move explanation.
    pub fn explain_position(&self, index: usize) -> Option<String> {
        let annotation = self.annotations.get(index)?;
        let label = annotation.label();

        if index > 0 && !annotation.analyzed {
            return Some(format!("{label}: Position not analyzed."));
        }

        let mut parts = vec![Advantage::from_centipawns(annotation.evaluation).sentence()];
        if index > 0 {
            match annotation.severity {
                Severity::Blunder => {
                    parts.push("This was a major mistake.".to_string());
                    if let Some(best) = self.best_move_san(index) {
                        parts.push(format!("The best move was {best}."));
                    }
                }
                Severity::Mistake => parts.push("This was a mistake.".to_string()),
                Severity::Inaccuracy => parts.push("This was an inaccuracy.".to_string()),
                Severity::None => parts.push("This was a good move.".to_string()),
            }
            parts.push(render(annotation));
        }

        Some(format!("{label}: {}", parts.join(" ")))
    }

    /// The recommended move for ply `index`, in SAN from the position it was played in
    fn best_move_san(&self, index: usize) -> Option<String> {
        let recommended = self.annotations.get(index)?.recommended?;
        let fen = self.fens.get(index.checked_sub(1)?)?;
        let rules = ChessRules::from_fen(fen).ok()?;
        rules.san(&recommended)
    }

    /// Markdown post-game report
    pub fn formatted_report(&self) -> String {
        format_report(&self.summary(), &self.annotations)
    }

    /// Give the engine back for another game
    pub fn into_engine(self) -> E {
        self.engine
    }
}

/// Sixth FEN field; 1 when missing or malformed
fn fullmove_number(fen: &str) -> u32 {
    fen.split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1)
}
