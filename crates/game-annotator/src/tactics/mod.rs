//! Tactical motif detection for a moved piece, run on the position after the move.

pub mod attacks;
pub mod pins;

use std::fmt;

use chess_core::types::serialize_square;
use chess_core::{PieceKind, Rules, Side, Square};
use serde::Serialize;

/// An opposing piece affected by a motif
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Target {
    #[serde(serialize_with = "serialize_square")]
    pub square: Square,
    pub piece: PieceKind,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the {} on {}", self.piece.name(), self.square)
    }
}

/// Detected motifs. `fork` and `attack` overlap at detection time; the renderer
/// picks at most one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TacticalMotifs {
    pub fork: Vec<Target>,
    pub attack: Vec<Target>,
    pub threat: Vec<Target>,
    pub pin: Vec<Target>,
    pub defense: Vec<Target>,
}

impl TacticalMotifs {
    /// Run every detector for the piece of `mover` standing on `to`.
    pub fn detect<R: Rules + ?Sized>(rules: &R, to: Square, mover: Side) -> Self {
        let targets = attacks::scan_targets(rules, to, mover);
        Self {
            fork: attacks::fork(&targets),
            attack: attacks::attack(&targets),
            threat: pins::detect_threat(rules, to, mover),
            pin: pins::detect_pin(rules, to, mover),
            defense: pins::detect_defense(rules, to, mover),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fork.is_empty()
            && self.attack.is_empty()
            && self.threat.is_empty()
            && self.pin.is_empty()
            && self.defense.is_empty()
    }
}
