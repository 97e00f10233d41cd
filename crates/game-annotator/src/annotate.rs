//! Per-move facts: what moved, what it took, and what it attacks afterwards.

use chess_core::shakmaty::Rank;
use chess_core::types::serialize_square;
use chess_core::{CastleSide, Piece, PieceKind, PlyMove, Rules, Side, Square};
use serde::Serialize;

use crate::error::AnnotateError;
use crate::tactics::TacticalMotifs;

/// Everything the renderer needs to know about one move, minus engine data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFacts {
    pub mover: Side,
    pub piece: PieceKind,
    #[serde(serialize_with = "serialize_square")]
    pub from: Square,
    #[serde(serialize_with = "serialize_square")]
    pub to: Square,
    pub captured: Option<PieceKind>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub castle: Option<CastleSide>,
    pub promotion: Option<PieceKind>,
    pub motifs: TacticalMotifs,
}

impl MoveFacts {
    /// Material value of the captured piece in pawns, 0 for quiet moves
    pub fn capture_value(&self) -> i32 {
        self.captured.map(PieceKind::value).unwrap_or(0)
    }
}

/// Extract the facts of `mv` played from the current position of `rules`.
///
/// The move is applied and reverted on `rules`; its position is the same on return
/// whether this succeeds or fails.
pub fn annotate<R: Rules + ?Sized>(rules: &mut R, mv: &PlyMove) -> Result<MoveFacts, AnnotateError> {
    let origin = rules
        .piece_at(mv.from)
        .ok_or_else(|| AnnotateError::invalid_move(mv, "no piece on origin square"))?;
    let mv = with_default_promotion(mv, origin);

    let applied = rules
        .apply_move(&mv)
        .ok_or_else(|| AnnotateError::invalid_move(mv, "illegal in this position"))?;

    let facts = MoveFacts {
        mover: origin.side,
        piece: origin.kind,
        from: mv.from,
        to: mv.to,
        captured: applied.captured,
        is_check: rules.is_check(),
        is_checkmate: rules.is_checkmate(),
        castle: applied.castle,
        promotion: applied.promotion,
        motifs: TacticalMotifs::detect(&*rules, mv.to, origin.side),
    };

    rules.undo();
    Ok(facts)
}

/// A pawn reaching the last rank without a promotion piece becomes a queen
fn with_default_promotion(mv: &PlyMove, origin: Piece) -> PlyMove {
    let last_rank = match origin.side {
        Side::White => Rank::Eighth,
        Side::Black => Rank::First,
    };
    if origin.kind == PieceKind::Pawn && mv.promotion.is_none() && mv.to.rank() == last_rank {
        mv.with_promotion(PieceKind::Queen)
    } else {
        *mv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::ChessRules;

    fn mv(text: &str) -> PlyMove {
        text.parse().unwrap()
    }

    #[test]
    fn test_annotate_leaves_position_unchanged() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2",
            "7k/r3q3/8/8/1N6/8/8/6K1 w - - 0 1",
        ];
        for fen in fens {
            let mut rules = ChessRules::from_fen(fen).unwrap();
            let before = rules.to_fen();
            let depth = rules.depth();
            let moves: Vec<PlyMove> = {
                use chess_core::shakmaty::Position;
                rules
                    .position()
                    .legal_moves()
                    .iter()
                    .filter_map(|m| {
                        let uci = m.to_uci(chess_core::shakmaty::CastlingMode::Standard).to_string();
                        uci.parse().ok()
                    })
                    .collect()
            };
            assert!(!moves.is_empty());
            for m in &moves {
                annotate(&mut rules, m).unwrap();
                assert_eq!(rules.to_fen(), before, "{m} changed {fen}");
                assert_eq!(rules.depth(), depth);
            }
        }
    }

    #[test]
    fn test_error_paths_leave_position_unchanged() {
        let mut rules = ChessRules::new();
        let before = rules.to_fen();

        let err = annotate(&mut rules, &mv("e3e4")).unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidMove { .. }));
        assert_eq!(rules.to_fen(), before);

        let err = annotate(&mut rules, &mv("e2e5")).unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidMove { .. }));
        assert_eq!(rules.to_fen(), before);
    }

    #[test]
    fn test_fork_has_two_targets() {
        let mut rules = ChessRules::from_fen("7k/r3q3/8/8/1N6/8/8/6K1 w - - 0 1").unwrap();
        let facts = annotate(&mut rules, &mv("b4c6")).unwrap();
        assert_eq!(facts.piece, PieceKind::Knight);
        assert_eq!(facts.motifs.fork.len(), 2);
        assert_eq!(facts.motifs.fork[0].square, Square::A7);
        assert_eq!(facts.motifs.fork[1].square, Square::E7);
        assert!(facts.motifs.pin.is_empty());
    }

    #[test]
    fn test_single_target_is_attack_only() {
        let mut rules = ChessRules::from_fen("7k/4q3/8/8/1N6/8/8/6K1 w - - 0 1").unwrap();
        let facts = annotate(&mut rules, &mv("b4c6")).unwrap();
        assert!(facts.motifs.fork.is_empty());
        assert_eq!(facts.motifs.attack.len(), 1);
        assert_eq!(facts.motifs.attack[0].piece, PieceKind::Queen);
    }

    #[test]
    fn test_capture_check_and_castle_flags() {
        let mut rules = ChessRules::from_fen("4k3/8/8/8/8/8/4q3/4R1K1 w - - 0 1").unwrap();
        let facts = annotate(&mut rules, &mv("e1e2")).unwrap();
        assert_eq!(facts.captured, Some(PieceKind::Queen));
        assert_eq!(facts.capture_value(), 9);
        assert!(facts.is_check);
        assert!(!facts.is_checkmate);

        let mut rules = ChessRules::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let facts = annotate(&mut rules, &mv("e1c1")).unwrap();
        assert_eq!(facts.castle, Some(CastleSide::Queenside));
        assert_eq!(facts.piece, PieceKind::King);
        assert_eq!(facts.mover, Side::White);
    }

    #[test]
    fn test_bare_pawn_push_to_last_rank_promotes_to_queen() {
        let mut rules = ChessRules::from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let facts = annotate(&mut rules, &mv("e7e8")).unwrap();
        assert_eq!(facts.promotion, Some(PieceKind::Queen));

        let facts = annotate(&mut rules, &mv("e7e8n")).unwrap();
        assert_eq!(facts.promotion, Some(PieceKind::Knight));
    }
}
