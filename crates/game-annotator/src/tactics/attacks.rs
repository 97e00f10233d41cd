//! Attack-based detectors: fork, attack

use chess_core::shakmaty::{File, Rank};
use chess_core::{Rules, Side, Square};

use super::Target;

/// Every opposing piece the piece on `from` attacks, scanning rank 8 down to 1
/// and file a to h within a rank.
///
/// Brute force over all 64 squares; fine for post-game analysis, too slow for
/// anything per-frame.
pub fn scan_targets<R: Rules + ?Sized>(rules: &R, from: Square, mover: Side) -> Vec<Target> {
    let mut targets = Vec::new();
    for rank in Rank::ALL.into_iter().rev() {
        for file in File::ALL {
            let square = Square::from_coords(file, rank);
            if square == from {
                continue;
            }
            let Some(piece) = rules.piece_at(square) else {
                continue;
            };
            if piece.side == mover {
                continue;
            }
            if rules.attacks(from, square) {
                targets.push(Target {
                    square,
                    piece: piece.kind,
                });
            }
        }
    }
    targets
}

/// Fork: two or more opposing pieces attacked at once
pub fn fork(targets: &[Target]) -> Vec<Target> {
    if targets.len() >= 2 {
        targets.to_vec()
    } else {
        Vec::new()
    }
}

/// Attack: at least one opposing piece attacked
pub fn attack(targets: &[Target]) -> Vec<Target> {
    targets.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{ChessRules, PieceKind};

    #[test]
    fn test_scan_order_is_rank_major_from_eighth_rank() {
        // Black knight on c6 forking four white pieces
        let rules = ChessRules::from_fen("7k/R3Q3/2n5/R3N3/8/8/8/6K1 w - - 0 1").unwrap();
        let targets = scan_targets(&rules, Square::C6, Side::Black);
        let squares: Vec<Square> = targets.iter().map(|t| t.square).collect();
        assert_eq!(squares, vec![Square::A7, Square::E7, Square::A5, Square::E5]);
        assert_eq!(targets[1].piece, PieceKind::Queen);
    }

    #[test]
    fn test_own_pieces_are_not_targets() {
        let rules = ChessRules::from_fen("7k/r3Q3/2N5/8/8/8/8/6K1 w - - 0 1").unwrap();
        let targets = scan_targets(&rules, Square::C6, Side::White);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].square, Square::A7);
    }

    #[test]
    fn test_single_target_is_attack_not_fork() {
        let one = vec![Target {
            square: Square::E7,
            piece: PieceKind::Queen,
        }];
        assert!(fork(&one).is_empty());
        assert_eq!(attack(&one).len(), 1);

        let two = vec![
            one[0],
            Target {
                square: Square::A7,
                piece: PieceKind::Rook,
            },
        ];
        assert_eq!(fork(&two).len(), 2);
        assert!(attack(&[]).is_empty());
    }
}
