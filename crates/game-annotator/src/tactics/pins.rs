//! Line and defensive motifs: pin, threat, defense.
//!
//! Not implemented. These always report nothing, so the renderer never selects
//! the pin, threat or defensive templates.

use chess_core::{Rules, Side, Square};

use super::Target;

pub fn detect_pin<R: Rules + ?Sized>(_rules: &R, _from: Square, _mover: Side) -> Vec<Target> {
    Vec::new()
}

pub fn detect_threat<R: Rules + ?Sized>(_rules: &R, _from: Square, _mover: Side) -> Vec<Target> {
    Vec::new()
}

pub fn detect_defense<R: Rules + ?Sized>(_rules: &R, _from: Square, _mover: Side) -> Vec<Target> {
    Vec::new()
}
