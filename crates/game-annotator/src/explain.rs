//! Natural-language explanations for annotated moves.
//!
//! One template is picked per move by a fixed priority order, filled from the move's
//! facts, then followed by an optional continuation clause and an evaluation clause.
//! Rendering never fails: a placeholder with no value stays in the text as written.

use std::collections::HashMap;
use std::sync::LazyLock;

use chess_core::{CastleSide, ChessRules, PieceKind, PlyMove, Rules, Side};
use regex::{Captures, Regex};

use crate::annotate::MoveFacts;
use crate::pipeline::MoveAnnotation;
use crate::score::{for_side, mate_distance};
use crate::tactics::Target;

/// Plies of the principal variation spelled out in the continuation clause
const CONTINUATION_PLIES: usize = 5;

const STARTING_POSITION: &str = "This is the starting position. No move has been played yet.";
const NOT_ANALYZED: &str = "This move continues the game. No detailed analysis is available for it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Checkmate,
    Check,
    Promotion,
    Castle,
    Capture,
    Fork,
    Pin,
    Attack,
    Threat,
    Defense,
    Develop,
    ControlCenter,
    Improvement,
}

impl Template {
    pub fn text(self) -> &'static str {
        match self {
            Template::Checkmate => "{pieceType} to {square} delivers checkmate! The opponent's king is attacked and has no legal moves.",
            Template::Check => "{pieceType} to {square} delivers check to the opponent's king, forcing them to respond immediately.",
            Template::Promotion => "The pawn advances to {square} and promotes to a {promotionPiece}, gaining a significant material advantage.",
            Template::Castle => "Castling {side} places the king in safety and connects the rooks, preparing for {followupAction}.",
            Template::Capture => "{pieceType} captures the {capturedPiece} on {square}, gaining material advantage of {value}.",
            Template::Fork => "{pieceType} to {square} creates a fork, simultaneously attacking {targets}.",
            Template::Pin => "{pieceType} to {square} pins the {pinnedPiece} against their {valuablePiece}, restricting its movement.",
            Template::Attack => "{pieceType} to {square} attacks {targets}, creating pressure that's difficult to defend against.",
            Template::Threat => "{pieceType} to {square} creates a threat against {targetPiece}, forcing {likelyResponse}.",
            Template::Defense => "{pieceType} to {square} protects {protectedPiece} from the threat of {threatDescription}.",
            Template::Develop => "{pieceType} moves to {square}, improving piece development and {additionalBenefit}.",
            Template::ControlCenter => "{pieceType} to {square} strengthens control over the central squares, particularly {controlledSquares}.",
            Template::Improvement => "{pieceType} to {square} is a positional improvement, {improvementReason}.",
        }
    }
}

/// First matching template wins.
///
/// Development and center control have no detector, so those templates are never picked.
pub fn select_template(facts: &MoveFacts) -> Template {
    let motifs = &facts.motifs;
    if facts.is_checkmate {
        Template::Checkmate
    } else if facts.is_check {
        Template::Check
    } else if facts.promotion.is_some() {
        Template::Promotion
    } else if facts.castle.is_some() {
        Template::Castle
    } else if facts.captured.is_some() {
        Template::Capture
    } else if !motifs.fork.is_empty() {
        Template::Fork
    } else if !motifs.pin.is_empty() {
        Template::Pin
    } else if !motifs.attack.is_empty() {
        Template::Attack
    } else if !motifs.threat.is_empty() {
        Template::Threat
    } else if !motifs.defense.is_empty() {
        Template::Defense
    } else {
        Template::Improvement
    }
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}]+)\}").unwrap());

/// Substitute `{name}` placeholders. Unknown names are left untouched.
pub fn fill_template(template: &str, vars: &HashMap<&str, String>) -> String {
    PLACEHOLDER.replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    })
    .into_owned()
}

/// "the knight on c6, the rook on a7 and the queen on e7"
pub fn format_piece_list(targets: &[Target]) -> String {
    let items: Vec<String> = targets.iter().map(Target::to_string).collect();
    join_with_and(&items)
}

fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

/// Why a quiet move helps, from the mover-relative evaluation change
pub fn improvement_reason(piece: PieceKind, gain: Option<i32>) -> &'static str {
    match gain {
        Some(gain) if gain > 100 => "creating a significant advantage",
        Some(gain) if gain > 50 => "gaining a clear advantage",
        Some(gain) if gain > 20 => "making a slight improvement",
        _ => match piece {
            PieceKind::Pawn => "advancing the pawn structure",
            PieceKind::Knight => "improving the knight's position",
            PieceKind::Bishop => "placing the bishop on a more active diagonal",
            PieceKind::Rook => "placing the rook on a more active file",
            PieceKind::Queen => "repositioning the queen for greater effect",
            PieceKind::King => "improving king safety",
        },
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn template_vars(template: Template, facts: &MoveFacts, gain: Option<i32>) -> HashMap<&'static str, String> {
    let motifs = &facts.motifs;
    let mut vars = HashMap::new();
    vars.insert("pieceType", capitalize(facts.piece.name()));
    vars.insert("square", facts.to.to_string());

    match template {
        Template::Promotion => {
            if let Some(kind) = facts.promotion {
                vars.insert("promotionPiece", kind.name().to_string());
            }
        }
        Template::Castle => {
            if let Some(side) = facts.castle {
                vars.insert("side", side.name().to_string());
                let followup = match side {
                    CastleSide::Kingside => "a kingside attack",
                    CastleSide::Queenside => "queenside play",
                };
                vars.insert("followupAction", followup.to_string());
            }
        }
        Template::Capture => {
            if let Some(kind) = facts.captured {
                vars.insert("capturedPiece", kind.name().to_string());
                vars.insert("value", facts.capture_value().to_string());
            }
        }
        Template::Fork => {
            vars.insert("targets", format_piece_list(&motifs.fork));
        }
        Template::Attack => {
            vars.insert("targets", format_piece_list(&motifs.attack));
        }
        Template::Pin => {
            if let Some(pinned) = motifs.pin.first() {
                vars.insert("pinnedPiece", pinned.piece.name().to_string());
            }
            if let Some(behind) = motifs.pin.get(1) {
                vars.insert("valuablePiece", behind.piece.name().to_string());
            }
        }
        Template::Threat => {
            if let Some(target) = motifs.threat.first() {
                vars.insert("targetPiece", target.to_string());
            }
        }
        Template::Defense => {
            if let Some(target) = motifs.defense.first() {
                vars.insert("protectedPiece", target.to_string());
            }
        }
        Template::Improvement => {
            vars.insert("improvementReason", improvement_reason(facts.piece, gain).to_string());
        }
        Template::Checkmate | Template::Check | Template::Develop | Template::ControlCenter => {}
    }
    vars
}

/// " The best continuation would be X, followed by Y, and then Z."
///
/// Moves are converted to SAN from `fen`, stopping at the first one that cannot be played.
pub fn continuation_clause(fen: &str, pv: &[PlyMove]) -> String {
    let Ok(mut rules) = ChessRules::from_fen(fen) else {
        return String::new();
    };

    let mut moves = Vec::new();
    for mv in pv.iter().take(CONTINUATION_PLIES) {
        let Some(san) = rules.san(mv) else {
            break;
        };
        if rules.apply_move(mv).is_none() {
            break;
        }
        moves.push(san);
    }

    match moves.as_slice() {
        [] => String::new(),
        [only] => format!(" The best continuation would be {only}."),
        [first, middle @ .., last] => {
            let mut text = format!(" The best continuation would be {first}");
            for san in middle {
                text.push_str(&format!(", followed by {san}"));
            }
            text.push_str(&format!(", and then {last}."));
            text
        }
    }
}

/// Coarse reading of a White-relative evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advantage {
    Mate { side: Side, moves: i32 },
    Decisive(Side),
    Clear(Side),
    Slight(Side),
    Equal,
}

impl Advantage {
    pub fn from_centipawns(cp: i32) -> Self {
        let side = if cp > 0 { Side::White } else { Side::Black };
        if let Some(moves) = mate_distance(cp) {
            return Advantage::Mate { side, moves };
        }
        match cp.abs() {
            n if n > 500 => Advantage::Decisive(side),
            n if n > 200 => Advantage::Clear(side),
            n if n > 50 => Advantage::Slight(side),
            _ => Advantage::Equal,
        }
    }

    /// "White has a clear advantage."
    pub fn sentence(self) -> String {
        match self {
            Advantage::Mate { side, moves: 0 } => format!("{} has delivered checkmate.", side.title()),
            Advantage::Mate { side, moves } => format!("{} has mate in {moves}.", side.title()),
            Advantage::Decisive(side) => format!("{} has a decisive advantage.", side.title()),
            Advantage::Clear(side) => format!("{} has a clear advantage.", side.title()),
            Advantage::Slight(side) => format!("{} has a slight advantage.", side.title()),
            Advantage::Equal => "The position is approximately equal.".to_string(),
        }
    }
}

/// Evaluation clause appended after the template
pub fn evaluation_clause(cp: i32) -> String {
    match Advantage::from_centipawns(cp) {
        Advantage::Mate { moves: 0, .. } => " This is checkmate.".to_string(),
        Advantage::Mate { moves, .. } => format!(" This leads to mate in {moves} moves."),
        Advantage::Decisive(side) => format!(" This gives {} a decisive advantage.", side.title()),
        Advantage::Clear(side) => format!(" This gives {} a clear advantage.", side.title()),
        Advantage::Slight(side) => format!(" This gives {} a slight advantage.", side.title()),
        Advantage::Equal => " The position remains approximately equal.".to_string(),
    }
}

/// Explain the move that produced `annotation`.
pub fn render(annotation: &MoveAnnotation) -> String {
    if annotation.played.is_none() {
        return STARTING_POSITION.to_string();
    }
    let Some(facts) = &annotation.facts else {
        return NOT_ANALYZED.to_string();
    };

    let gain = annotation
        .evaluation_change
        .filter(|_| annotation.analyzed)
        .map(|change| for_side(change, facts.mover));
    let template = select_template(facts);
    let mut text = fill_template(template.text(), &template_vars(template, facts, gain));

    // A delivered mate needs no continuation or evaluation
    if annotation.analyzed && !facts.is_checkmate {
        if annotation.principal_variation.len() > 1 {
            text.push_str(&continuation_clause(&annotation.fen, &annotation.principal_variation));
        }
        text.push_str(&evaluation_clause(annotation.evaluation));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate;
    use crate::score::encode_mate;
    use chess_core::Square;

    fn mv(text: &str) -> PlyMove {
        text.parse().unwrap()
    }

    /// Annotation for one move from `fen`, with the given White-relative evaluation
    fn annotated(fen: &str, uci: &str, evaluation: i32, pv: &[&str]) -> MoveAnnotation {
        let mut rules = ChessRules::from_fen(fen).unwrap();
        let played = mv(uci);
        let facts = annotate(&mut rules, &played).unwrap();
        let san = rules.san(&played);
        rules.apply_move(&played).unwrap();
        MoveAnnotation {
            ply: 1,
            fen: rules.to_fen(),
            move_number: 1,
            mover: Some(facts.mover),
            played: Some(played),
            san,
            facts: Some(facts),
            analyzed: true,
            evaluation,
            evaluation_change: Some(0),
            depth: 18,
            timed_out: false,
            recommended: None,
            principal_variation: pv.iter().map(|m| mv(m)).collect(),
            ..MoveAnnotation::default()
        }
    }

    #[test]
    fn test_fill_template_leaves_unknown_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("pieceType", "Rook".to_string());
        let text = fill_template("{pieceType} to {square}", &vars);
        assert_eq!(text, "Rook to {square}");
    }

    #[test]
    fn test_format_piece_list() {
        let target = |square, piece| Target { square, piece };
        assert_eq!(format_piece_list(&[]), "");
        assert_eq!(
            format_piece_list(&[target(Square::C6, PieceKind::Knight)]),
            "the knight on c6"
        );
        assert_eq!(
            format_piece_list(&[
                target(Square::C6, PieceKind::Knight),
                target(Square::A7, PieceKind::Rook),
                target(Square::E7, PieceKind::Queen),
            ]),
            "the knight on c6, the rook on a7 and the queen on e7"
        );
    }

    #[test]
    fn test_fork_explanation() {
        let annotation = annotated("7k/r3q3/8/8/1N6/8/8/6K1 w - - 0 1", "b4c6", 30, &[]);
        assert_eq!(
            render(&annotation),
            "Knight to c6 creates a fork, simultaneously attacking the rook on a7 and the queen on e7. \
             The position remains approximately equal."
        );
    }

    #[test]
    fn test_check_beats_capture() {
        let annotation = annotated("4k3/8/8/8/8/8/4q3/4R1K1 w - - 0 1", "e1e2", 900, &[]);
        let facts = annotation.facts.as_ref().unwrap();
        assert_eq!(select_template(facts), Template::Check);
        assert!(render(&annotation).starts_with("Rook to e2 delivers check"));
    }

    #[test]
    fn test_capture_and_castle_templates() {
        let annotation = annotated("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5", 120, &[]);
        assert_eq!(
            render(&annotation),
            "Pawn captures the pawn on d5, gaining material advantage of 1. \
             This gives White a slight advantage."
        );

        let annotation = annotated("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1", "e8g8", -250, &[]);
        assert_eq!(
            render(&annotation),
            "Castling kingside places the king in safety and connects the rooks, preparing for a kingside attack. \
             This gives Black a clear advantage."
        );
    }

    #[test]
    fn test_continuation_clause() {
        let annotation = annotated(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "e2e4",
            35,
            &["e7e5", "g1f3", "b8c6"],
        );
        assert_eq!(
            render(&annotation),
            "Pawn to e4 is a positional improvement, advancing the pawn structure. \
             The best continuation would be e5, followed by Nf3, and then Nc6. \
             The position remains approximately equal."
        );
    }

    #[test]
    fn test_continuation_stops_at_unplayable_move() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        assert_eq!(
            continuation_clause(fen, &[mv("e7e5"), mv("e1e3"), mv("g1f3")]),
            " The best continuation would be e5."
        );
        assert_eq!(continuation_clause(fen, &[mv("a1a8")]), "");
    }

    #[test]
    fn test_evaluation_bands() {
        assert_eq!(evaluation_clause(encode_mate(3)), " This leads to mate in 3 moves.");
        assert_eq!(evaluation_clause(-encode_mate(2)), " This leads to mate in 2 moves.");
        assert_eq!(evaluation_clause(600), " This gives White a decisive advantage.");
        assert_eq!(evaluation_clause(-300), " This gives Black a clear advantage.");
        assert_eq!(evaluation_clause(51), " This gives White a slight advantage.");
        assert_eq!(evaluation_clause(-50), " The position remains approximately equal.");
    }

    #[test]
    fn test_delivered_mate_is_not_mate_in_zero() {
        // White to move and mated after Qh4#
        let mated = encode_mate(0);
        assert_eq!(mated, -20000);
        assert_eq!(
            Advantage::from_centipawns(mated).sentence(),
            "Black has delivered checkmate."
        );
        assert_eq!(Advantage::from_centipawns(20000).sentence(), "White has delivered checkmate.");
        assert_eq!(evaluation_clause(mated), " This is checkmate.");
        assert_eq!(
            Advantage::from_centipawns(-encode_mate(1)).sentence(),
            "Black has mate in 1."
        );
    }

    #[test]
    fn test_improvement_reason_prefers_evaluation_gain() {
        assert_eq!(
            improvement_reason(PieceKind::Rook, Some(150)),
            "creating a significant advantage"
        );
        assert_eq!(
            improvement_reason(PieceKind::Rook, Some(10)),
            "placing the rook on a more active file"
        );
        assert_eq!(improvement_reason(PieceKind::King, None), "improving king safety");
    }

    #[test]
    fn test_degraded_text() {
        assert_eq!(render(&MoveAnnotation::default()), STARTING_POSITION);

        let mut annotation = annotated("7k/8/8/8/8/8/8/R5K1 w - - 0 1", "a1a2", 0, &[]);
        annotation.facts = None;
        annotation.analyzed = false;
        assert_eq!(render(&annotation), NOT_ANALYZED);
    }
}
