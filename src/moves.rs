// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Moves and move history entries.
//!
//! A `Move` names its source and destination squares and the kind of piece
//! that moves. Two flags mark the special moves whose side effects reach
//! beyond the destination square:
//!
//!  * `is_castle` - the king moves two squares and the rook on that wing
//!    jumps over it.
//!  * `is_en_passant` - a pawn captures the pawn that has just passed it, and
//!    the captured pawn is not on the destination square.
//!
//! Promotions carry the kind the pawn turns into. Captures and double pawn
//! pushes are not flagged: both are determined by the board the move is
//! played on.
use std::fmt;

use crate::types::{CastlingRights, PieceKind, Square};
use crate::types::{File, TableIndex};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    #[serde(default)]
    pub promotion: Option<PieceKind>,
    #[serde(default)]
    pub is_castle: bool,
    #[serde(default)]
    pub is_en_passant: bool,
}

impl Move {
    /// A plain move or capture of `piece` from `from` to `to`.
    pub fn new(from: Square, to: Square, piece: PieceKind) -> Move {
        Move {
            from,
            to,
            piece,
            promotion: None,
            is_castle: false,
            is_en_passant: false,
        }
    }

    /// A pawn move to the last rank, turning the pawn into `promoted`.
    pub fn promotion(from: Square, to: Square, promoted: PieceKind) -> Move {
        Move {
            promotion: Some(promoted),
            ..Move::new(from, to, PieceKind::Pawn)
        }
    }

    /// A castle, encoded by the king's start and stop squares.
    pub fn castle(from: Square, to: Square) -> Move {
        Move {
            is_castle: true,
            ..Move::new(from, to, PieceKind::King)
        }
    }

    /// An en-passant capture, encoded by the capturing pawn's start square and the square it
    /// lands on (the en-passant target).
    pub fn en_passant(from: Square, to: Square) -> Move {
        Move {
            is_en_passant: true,
            ..Move::new(from, to, PieceKind::Pawn)
        }
    }

    pub fn is_promotion(self) -> bool {
        self.promotion.is_some()
    }

    pub fn is_kingside_castle(self) -> bool {
        self.is_castle && self.to.file() == File::G
    }

    pub fn is_queenside_castle(self) -> bool {
        self.is_castle && self.to.file() == File::C
    }

    pub fn is_double_pawn_push(self) -> bool {
        if self.piece != PieceKind::Pawn || self.from.file() != self.to.file() {
            return false;
        }

        let from_rank = self.from.rank().as_index() as i32;
        let to_rank = self.to.rank().as_index() as i32;
        (from_rank - to_rank).abs() == 2
    }

    /// Whether `other` names the same squares and promotion as this move, regardless of the
    /// flags and piece kind.
    pub fn same_squares(self, other: Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    /// The UCI representation of this move, e.g. `e2e4` or `e7e8q`.
    pub fn as_uci(self) -> String {
        match self.promotion {
            Some(kind) => format!("{}{}{}", self.from, self.to, kind),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_uci())
    }
}

/// One entry of a position's move history: the move that was played and the
/// state that move destroyed, so that it can be taken back exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "move")]
    pub mov: Move,
    pub captured: Option<PieceKind>,
    pub prior_castling: CastlingRights,
    pub prior_en_passant: Option<Square>,
    pub prior_halfmove_clock: u32,
}

impl HistoryEntry {
    /// Whether this move reset the halfmove clock, i.e. can never be repeated.
    pub fn is_irreversible(&self) -> bool {
        self.captured.is_some() || self.mov.piece == PieceKind::Pawn
    }
}
