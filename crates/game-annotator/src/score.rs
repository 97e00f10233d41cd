//! Centipawn scores and the mate-score encoding.
//!
//! Mate scores are folded into the centipawn scale as `sign * (20000 - 10 * n)`,
//! where `n` is the engine's mate distance. Every mate score is therefore larger in
//! magnitude than [`MATE_THRESHOLD`], and a shorter mate is a larger magnitude.

use chess_core::Side;
use serde::Serialize;

const MATE_BASE: i32 = 20_000;
const MATE_STEP: i32 = 10;

/// Any score beyond this magnitude is a forced mate
pub const MATE_THRESHOLD: i32 = 10_000;

/// Engine score relative to the side to move, as reported over UCI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Score {
    Centipawns(i32),
    /// Mate in N; negative when the side to move gets mated
    Mate(i32),
}

impl Score {
    /// Fold into the centipawn scale, still side-to-move relative
    pub fn to_centipawns(self) -> i32 {
        match self {
            Score::Centipawns(cp) => cp,
            Score::Mate(n) => encode_mate(n),
        }
    }

    /// Centipawns from White's point of view
    pub fn white_pov(self, side_to_move: Side) -> i32 {
        let cp = self.to_centipawns();
        match side_to_move {
            Side::White => cp,
            Side::Black => -cp,
        }
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::Centipawns(0)
    }
}

/// Encode a signed mate distance. `0` means the side to move is already mated.
pub fn encode_mate(distance: i32) -> i32 {
    let magnitude = MATE_BASE - MATE_STEP * distance.abs();
    if distance <= 0 {
        -magnitude
    } else {
        magnitude
    }
}

pub fn is_mate_score(cp: i32) -> bool {
    cp.abs() > MATE_THRESHOLD
}

/// Recover the mate distance from an encoded score: `ceil((20000 - |s|) / 10)`
pub fn mate_distance(cp: i32) -> Option<i32> {
    if !is_mate_score(cp) {
        return None;
    }
    let remaining = MATE_BASE - cp.abs();
    Some((remaining + MATE_STEP - 1) / MATE_STEP)
}

/// Re-express a White-relative score from one side's point of view
pub fn for_side(white_cp: i32, side: Side) -> i32 {
    match side {
        Side::White => white_cp,
        Side::Black => -white_cp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_encoding_round_trips() {
        for k in 1..=50 {
            let encoded = encode_mate(k);
            assert!(encoded.abs() > 1000);
            assert_eq!(mate_distance(encoded), Some(k));
            assert_eq!(mate_distance(-encoded), Some(k));
        }
    }

    #[test]
    fn test_shorter_mates_are_larger() {
        assert!(encode_mate(1) > encode_mate(2));
        assert!(encode_mate(-1) < encode_mate(-2));
        assert_eq!(encode_mate(3), 19_970);
        assert_eq!(encode_mate(-3), -19_970);
        assert_eq!(encode_mate(0), -20_000);
    }

    #[test]
    fn test_plain_scores_are_not_mates() {
        assert_eq!(mate_distance(950), None);
        assert_eq!(mate_distance(-MATE_THRESHOLD), None);
    }

    #[test]
    fn test_white_pov() {
        assert_eq!(Score::Centipawns(35).white_pov(Side::White), 35);
        assert_eq!(Score::Centipawns(35).white_pov(Side::Black), -35);
        assert_eq!(Score::Mate(2).white_pov(Side::Black), -19_980);
        assert_eq!(for_side(-120, Side::Black), 120);
    }
}
