//! Mistake classification. Pure functions over White-relative centipawn scores.

use chess_core::{PlyMove, Side};
use serde::Serialize;

use crate::score::{for_side, is_mate_score};

/// Loss beyond which a squandered forced mate is a blunder
const MATE_LOSS_THRESHOLD: i32 = 1000;

const THRESHOLD_BLUNDER: i32 = 200;
const THRESHOLD_MISTAKE: i32 = 80;
const THRESHOLD_INACCURACY: i32 = 40;

/// Maximum CP loss counted towards accuracy
const MAX_CP_LOSS: i32 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl Severity {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Inaccuracy => "inaccuracy",
            Severity::Mistake => "mistake",
            Severity::Blunder => "blunder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub severity: Severity,
    pub comment: &'static str,
    /// Mover-relative loss, capped for accuracy purposes
    pub cp_loss: i32,
}

impl Classification {
    fn new(severity: Severity, comment: &'static str, cp_loss: i32) -> Self {
        Self {
            severity,
            comment,
            cp_loss,
        }
    }
}

/// Tolerance band that widens as the position gets more decisive
pub fn error_margin(eval_before: i32) -> f64 {
    eval_before.abs() as f64 * 0.1 + 10.0
}

/// Classify a played move.
///
/// `eval_before` is the engine's evaluation of the position the move was played from
/// (what the recommended move keeps), `eval_after` the evaluation after the played move.
/// Both are White-relative.
pub fn classify(
    eval_before: i32,
    recommended: Option<&PlyMove>,
    played: Option<&PlyMove>,
    eval_after: i32,
    mover: Side,
) -> Classification {
    let Some(played) = played else {
        return Classification::new(Severity::None, "Position evaluation", 0);
    };
    let Some(recommended) = recommended else {
        return Classification::new(Severity::None, "Reasonable move", 0);
    };
    if recommended == played {
        return Classification::new(Severity::None, "Excellent move", 0);
    }

    let before = for_side(eval_before, mover);
    let after = for_side(eval_after, mover);
    let loss = (before - after).max(0);
    let cp_loss = loss.min(MAX_CP_LOSS);
    let margin = error_margin(eval_before);
    let beyond = |threshold: i32| loss > threshold && loss as f64 > margin;

    if is_mate_score(before) && before > 0 && loss > MATE_LOSS_THRESHOLD {
        Classification::new(Severity::Blunder, "Missed checkmate sequence", cp_loss)
    } else if beyond(THRESHOLD_BLUNDER) {
        Classification::new(Severity::Blunder, "Major mistake", cp_loss)
    } else if beyond(THRESHOLD_MISTAKE) {
        Classification::new(Severity::Mistake, "Mistake", cp_loss)
    } else if beyond(THRESHOLD_INACCURACY) {
        Classification::new(Severity::Inaccuracy, "Inaccuracy", cp_loss)
    } else {
        Classification::new(Severity::None, "Reasonable move", cp_loss)
    }
}

/// Accuracy percentage from the average CP loss
pub fn calculate_accuracy(total_cp_loss: i32, move_count: u32) -> f64 {
    if move_count == 0 {
        return 100.0;
    }
    let acpl = total_cp_loss as f64 / move_count as f64;
    let accuracy = 100.0 * (1.0 / (1.0 + acpl / 100.0)).sqrt();
    accuracy.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::encode_mate;

    fn mv(text: &str) -> PlyMove {
        text.parse().unwrap()
    }

    fn severity(before: i32, after: i32, mover: Side) -> Severity {
        classify(before, Some(&mv("e2e4")), Some(&mv("d2d4")), after, mover).severity
    }

    #[test]
    fn test_comments_without_comparison() {
        let played = mv("e2e4");
        assert_eq!(classify(0, None, None, 0, Side::White).comment, "Position evaluation");
        assert_eq!(
            classify(0, None, Some(&played), -500, Side::White).comment,
            "Reasonable move"
        );
        let same = classify(300, Some(&played), Some(&played), -900, Side::White);
        assert_eq!(same.severity, Severity::None);
        assert_eq!(same.comment, "Excellent move");
    }

    #[test]
    fn test_tiers() {
        assert_eq!(severity(0, -30, Side::White), Severity::None);
        assert_eq!(severity(0, -50, Side::White), Severity::Inaccuracy);
        assert_eq!(severity(0, -100, Side::White), Severity::Mistake);
        assert_eq!(severity(0, -250, Side::White), Severity::Blunder);
        // Black gains when the White-relative score rises
        assert_eq!(severity(0, 250, Side::Black), Severity::Blunder);
        assert_eq!(severity(0, -250, Side::Black), Severity::None);
    }

    #[test]
    fn test_margin_widens_in_decisive_positions() {
        // margin = 110: a 100cp loss is not enough
        assert_eq!(severity(1000, 900, Side::White), Severity::None);
        assert_eq!(severity(1000, 880, Side::White), Severity::Mistake);
    }

    #[test]
    fn test_missed_mate() {
        let c = classify(
            encode_mate(3),
            Some(&mv("d1h5")),
            Some(&mv("a2a3")),
            150,
            Side::White,
        );
        assert_eq!(c.severity, Severity::Blunder);
        assert_eq!(c.comment, "Missed checkmate sequence");
        assert_eq!(c.cp_loss, 500);

        // A slower mate is still fine
        let c = classify(
            encode_mate(3),
            Some(&mv("d1h5")),
            Some(&mv("a2a3")),
            encode_mate(4),
            Side::White,
        );
        assert_eq!(c.severity, Severity::None);
    }

    #[test]
    fn test_severity_monotonic_in_loss() {
        for before in [-600, -150, 0, 75, 400, 2000] {
            let mut previous = Severity::None;
            for loss in 0..1500 {
                let current = severity(before, before - loss, Side::White);
                assert!(current >= previous, "before={before} loss={loss}");
                previous = current;
            }
        }
    }

    #[test]
    fn test_calculate_accuracy() {
        assert!((calculate_accuracy(0, 20) - 100.0).abs() < 0.1);
        assert!((calculate_accuracy(500, 20) - 89.4).abs() < 1.0);
        assert!((calculate_accuracy(2000, 20) - 70.7).abs() < 1.0);
        assert_eq!(calculate_accuracy(0, 0), 100.0);
    }
}
