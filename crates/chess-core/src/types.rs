//! Plain domain types shared by the rules adapter and the annotation pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use shakmaty::{Color, Role, Square};

use crate::error::ChessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase English name used in explanations
    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    /// Material value in pawns (king counts as zero)
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight => 3,
            PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    /// Parse a UCI piece letter (either case)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

impl From<Role> for PieceKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Pawn => PieceKind::Pawn,
            Role::Knight => PieceKind::Knight,
            Role::Bishop => PieceKind::Bishop,
            Role::Rook => PieceKind::Rook,
            Role::Queen => PieceKind::Queen,
            Role::King => PieceKind::King,
        }
    }
}

impl From<PieceKind> for Role {
    fn from(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Pawn => Role::Pawn,
            PieceKind::Knight => Role::Knight,
            PieceKind::Bishop => Role::Bishop,
            PieceKind::Rook => Role::Rook,
            PieceKind::Queen => Role::Queen,
            PieceKind::King => Role::King,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// "White" / "Black", as used at the start of a sentence
    pub fn title(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub fn name(self) -> &'static str {
        match self {
            CastleSide::Kingside => "kingside",
            CastleSide::Queenside => "queenside",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

/// A move as origin square, destination square and optional promotion piece.
///
/// Only meaningful relative to a position; legality is decided by a [`crate::Rules`]
/// implementation. Castling is written as the king's two-square move (`e1g1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlyMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl PlyMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// Does this look like UCI text (`e2e4`, `e7e8q`)?
    pub fn is_uci(text: &str) -> bool {
        text.parse::<PlyMove>().is_ok()
    }
}

impl fmt::Display for PlyMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for PlyMove {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChessError::InvalidUci(s.to_string());
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }

        let from: Square = s[0..2].parse().map_err(|_| invalid())?;
        let to: Square = s[2..4].parse().map_err(|_| invalid())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_char(c) {
                Some(kind) if !matches!(kind, PieceKind::Pawn | PieceKind::King) => Some(kind),
                _ => return Err(invalid()),
            },
        };

        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

impl Serialize for PlyMove {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Serialize a square as its algebraic name
pub fn serialize_square<S: Serializer>(square: &Square, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(square)
}
