//! Game-level aggregates and the markdown post-game report

use chess_core::Side;
use serde::Serialize;

use crate::classify::{calculate_accuracy, Severity};
use crate::pipeline::MoveAnnotation;

/// Key moments listed by name in the report
const REPORTED_KEY_MOMENTS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameSummary {
    /// Plies, not counting the starting position
    pub total_positions: usize,
    pub white_inaccuracies: u32,
    pub white_mistakes: u32,
    pub white_blunders: u32,
    pub black_inaccuracies: u32,
    pub black_mistakes: u32,
    pub black_blunders: u32,
    pub white_accuracy: f64,
    pub black_accuracy: f64,
    /// Mean White-relative evaluation over every ply
    pub average_evaluation: f64,
    pub key_moments: usize,
    pub key_moment_indices: Vec<usize>,
}

#[derive(Default)]
struct SideTally {
    inaccuracies: u32,
    mistakes: u32,
    blunders: u32,
    cp_loss: i32,
    moves: u32,
}

impl SideTally {
    fn add(&mut self, annotation: &MoveAnnotation) {
        match annotation.severity {
            Severity::Inaccuracy => self.inaccuracies += 1,
            Severity::Mistake => self.mistakes += 1,
            Severity::Blunder => self.blunders += 1,
            Severity::None => {}
        }
        if annotation.analyzed {
            self.cp_loss += annotation.cp_loss;
            self.moves += 1;
        }
    }
}

impl GameSummary {
    /// Recompute the summary from an annotation sequence (index 0 is the starting position)
    pub fn from_annotations(annotations: &[MoveAnnotation]) -> Self {
        let plies = annotations.get(1..).unwrap_or_default();
        let mut white = SideTally::default();
        let mut black = SideTally::default();

        for annotation in plies {
            match annotation.mover {
                Some(Side::White) => white.add(annotation),
                Some(Side::Black) => black.add(annotation),
                None => {}
            }
        }

        let average_evaluation = if plies.is_empty() {
            0.0
        } else {
            plies.iter().map(|a| a.evaluation as f64).sum::<f64>() / plies.len() as f64
        };

        let key_moment_indices: Vec<usize> = annotations
            .iter()
            .filter(|a| a.is_key_moment())
            .map(|a| a.ply)
            .collect();

        Self {
            total_positions: plies.len(),
            white_inaccuracies: white.inaccuracies,
            white_mistakes: white.mistakes,
            white_blunders: white.blunders,
            black_inaccuracies: black.inaccuracies,
            black_mistakes: black.mistakes,
            black_blunders: black.blunders,
            white_accuracy: calculate_accuracy(white.cp_loss, white.moves),
            black_accuracy: calculate_accuracy(black.cp_loss, black.moves),
            average_evaluation,
            key_moments: key_moment_indices.len(),
            key_moment_indices,
        }
    }
}

/// Render the post-game report as markdown
pub fn format_report(summary: &GameSummary, annotations: &[MoveAnnotation]) -> String {
    let mut text = String::from("## Game Analysis Summary\n\n");

    if summary.average_evaluation.abs() < 50.0 {
        text.push_str("This was a closely contested game with both sides playing well.\n\n");
    } else if summary.average_evaluation > 0.0 {
        text.push_str("White had an advantage for most of the game.\n\n");
    } else {
        text.push_str("Black had an advantage for most of the game.\n\n");
    }

    text.push_str("### Mistakes Analysis\n\n");
    text.push_str(&format!(
        "White made {} inaccuracies, {} mistakes, and {} major mistakes (accuracy {:.1}%).\n",
        summary.white_inaccuracies, summary.white_mistakes, summary.white_blunders, summary.white_accuracy
    ));
    text.push_str(&format!(
        "Black made {} inaccuracies, {} mistakes, and {} major mistakes (accuracy {:.1}%).\n\n",
        summary.black_inaccuracies, summary.black_mistakes, summary.black_blunders, summary.black_accuracy
    ));

    text.push_str("### Key Moments\n\n");
    if summary.key_moment_indices.is_empty() {
        text.push_str("No critical turning points were identified.\n\n");
    } else {
        text.push_str(&format!(
            "There were {} key moments that significantly affected the game outcome:\n\n",
            summary.key_moments
        ));
        for &index in summary.key_moment_indices.iter().take(REPORTED_KEY_MOMENTS) {
            if let Some(annotation) = annotations.get(index) {
                text.push_str(&format!("- {}: {}\n", annotation.label(), annotation.comment));
            }
        }
        if summary.key_moments > REPORTED_KEY_MOMENTS {
            text.push_str("\n(Additional key moments are available in the detailed analysis)\n");
        }
    }

    text.push_str("\n### Improvement Suggestions\n\n");
    let white_errors = summary.white_mistakes + summary.white_blunders;
    let black_errors = summary.black_mistakes + summary.black_blunders;
    if white_errors > black_errors {
        text.push_str("White should focus on: ");
    } else {
        text.push_str("Black should focus on: ");
    }
    text.push_str("Reviewing opening principles and tactical awareness.\n\n");
    text.push_str("Keep practicing and analyzing your games to improve your chess skills!");
    text
}
