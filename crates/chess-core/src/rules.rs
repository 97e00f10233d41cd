//! Rules-engine contract and its shakmaty-backed implementation.
//!
//! The annotation pipeline never inspects board internals directly: it applies and
//! undoes moves and reads post-move flags through [`Rules`].

use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, CastlingSide, Chess, EnPassantMode, Move, Position, Role, Square};

use crate::error::ChessError;
use crate::types::{CastleSide, Piece, PieceKind, PlyMove, Side};

/// Why a position is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

/// Flags reported by the rules engine after a move was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// FEN of the resulting position
    pub fen: String,
    pub captured: Option<PieceKind>,
    pub castle: Option<CastleSide>,
    pub promotion: Option<PieceKind>,
}

/// Legal-move oracle and game state, treated as a black box by the annotator.
pub trait Rules {
    /// Apply a move; `None` means the move is illegal and nothing changed.
    fn apply_move(&mut self, mv: &PlyMove) -> Option<AppliedMove>;

    /// Revert the last applied move. Returns false when there is nothing to undo.
    fn undo(&mut self) -> bool;

    fn current_turn(&self) -> Side;

    fn is_check(&self) -> bool;

    fn is_checkmate(&self) -> bool;

    fn draw_reason(&self) -> Option<DrawReason>;

    fn is_draw(&self) -> bool {
        self.draw_reason().is_some()
    }

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn to_fen(&self) -> String;

    /// Does the piece on `from` attack `to` in the current position?
    fn attacks(&self, from: Square, to: Square) -> bool;

    /// SAN for a move in the current position, with `+`/`#` suffix
    fn san(&self, mv: &PlyMove) -> Option<String>;

    /// Interpret UCI or SAN text as a legal move in the current position
    fn resolve(&self, token: &str) -> Option<PlyMove>;
}

/// Standard chess rules over `shakmaty::Chess`, with an undo stack.
#[derive(Debug, Clone)]
pub struct ChessRules {
    pos: Chess,
    history: Vec<Chess>,
    /// Repetition keys for every position reached, current one last
    keys: Vec<String>,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl ChessRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let invalid = |reason: String| ChessError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self::from_position(pos))
    }

    fn from_position(pos: Chess) -> Self {
        let key = repetition_key(&pos);
        Self {
            pos,
            history: Vec::new(),
            keys: vec![key],
        }
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    /// Number of moves that can currently be undone
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Map a move onto a legal shakmaty move in the current position
    fn legal_move(&self, mv: &PlyMove) -> Option<Move> {
        let uci = UciMove::Normal {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion.map(Role::from),
        };
        let m = uci.to_move(&self.pos).ok()?;
        self.pos.is_legal(m.clone()).then_some(m)
    }
}

impl Rules for ChessRules {
    fn apply_move(&mut self, mv: &PlyMove) -> Option<AppliedMove> {
        let m = self.legal_move(mv)?;

        let captured = m.capture().map(PieceKind::from);
        let castle = m.castling_side().map(|side| match side {
            CastlingSide::KingSide => CastleSide::Kingside,
            CastlingSide::QueenSide => CastleSide::Queenside,
        });
        let promotion = m.promotion().map(PieceKind::from);

        let previous = self.pos.clone();
        self.pos.play_unchecked(m);
        self.history.push(previous);
        self.keys.push(repetition_key(&self.pos));

        Some(AppliedMove {
            fen: self.to_fen(),
            captured,
            castle,
            promotion,
        })
    }

    fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.pos = previous;
                self.keys.pop();
                true
            }
            None => false,
        }
    }

    fn current_turn(&self) -> Side {
        self.pos.turn().into()
    }

    fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    fn draw_reason(&self) -> Option<DrawReason> {
        if self.pos.is_stalemate() {
            return Some(DrawReason::Stalemate);
        }
        if self.pos.is_insufficient_material() {
            return Some(DrawReason::InsufficientMaterial);
        }
        if self.pos.halfmoves() >= 100 && !self.pos.is_checkmate() {
            return Some(DrawReason::FiftyMoveRule);
        }
        let current = self.keys.last()?;
        if self.keys.iter().filter(|k| *k == current).count() >= 3 {
            return Some(DrawReason::ThreefoldRepetition);
        }
        None
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pos.board().piece_at(square).map(|p| Piece {
            side: p.color.into(),
            kind: p.role.into(),
        })
    }

    fn to_fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    fn attacks(&self, from: Square, to: Square) -> bool {
        self.pos.board().attacks_from(from).contains(to)
    }

    fn san(&self, mv: &PlyMove) -> Option<String> {
        let m = self.legal_move(mv)?;
        let mut san = San::from_move(&self.pos, m.clone()).to_string();

        let mut after = self.pos.clone();
        after.play_unchecked(m);
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
        Some(san)
    }

    fn resolve(&self, token: &str) -> Option<PlyMove> {
        let token = token.trim();
        if let Ok(mv) = token.parse::<PlyMove>() {
            return self.legal_move(&mv).map(|_| mv);
        }

        let clean = token.trim_end_matches(['+', '#', '!', '?']);
        let san: San = clean.parse().ok()?;
        let m = san.to_move(&self.pos).ok()?;
        let from = m.from()?;
        let to = match m.castling_side() {
            // Castling is expressed as the king's two-square step
            Some(side) => Square::from_coords(side.king_to_file(), from.rank()),
            None => m.to(),
        };
        Some(PlyMove {
            from,
            to,
            promotion: m.promotion().map(PieceKind::from),
        })
    }
}

/// Board, side to move, castling rights and en passant square; clocks excluded
fn repetition_key(pos: &Chess) -> String {
    let fen = Fen::from_position(pos, EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
