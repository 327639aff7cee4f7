// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types. Every rejection the core can produce is one of the enums in
//! this module, and each of them carries a stable `code()` that callers can
//! match on without parsing messages.
use std::fmt;
use std::io;

use thiserror::Error;

use crate::position::FenParseError;
use crate::session::{SessionId, SessionStatus};
use crate::types::{Color, Square};

/// Why a move was rejected by the rules engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IllegalMoveReason {
    /// The piece on the source square belongs to the side that is not to move.
    NotYourTurn,
    /// Something stands in the way of the move.
    BlockedPath,
    /// The move would leave (or put) the mover's king in check, including castling out of,
    /// through or into check.
    LeavesKingInCheck,
    /// The piece cannot move that way, or the move does not describe the piece on the board.
    WrongPieceMovement,
    /// The move does not name a piece of any kind on its source square, or goes nowhere.
    MalformedSquare,
}

impl IllegalMoveReason {
    pub fn as_str(self) -> &'static str {
        match self {
            IllegalMoveReason::NotYourTurn => "not-your-turn",
            IllegalMoveReason::BlockedPath => "blocked-path",
            IllegalMoveReason::LeavesKingInCheck => "leaves-king-in-check",
            IllegalMoveReason::WrongPieceMovement => "wrong-piece-movement",
            IllegalMoveReason::MalformedSquare => "malformed-square",
        }
    }
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejections produced by the rules engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("illegal move: {reason}")]
    IllegalMove { reason: IllegalMoveReason },
    #[error("a pawn reaching the last rank must name its promotion piece")]
    MissingPromotionChoice,
    #[error("there is no move to take back")]
    NothingToUndo,
}

impl RulesError {
    pub fn illegal(reason: IllegalMoveReason) -> RulesError {
        RulesError::IllegalMove { reason }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RulesError::IllegalMove { .. } => "illegal_move",
            RulesError::MissingPromotionChoice => "missing_promotion_choice",
            RulesError::NothingToUndo => "nothing_to_undo",
        }
    }
}

/// Structural problems that make a board impossible to play from.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    Fen(#[from] FenParseError),
    #[error("{0} has no king")]
    MissingKing(Color),
    #[error("{0} has more than one king")]
    ExtraKing(Color),
    #[error("pawn on back rank square {0}")]
    PawnOnBackRank(Square),
    #[error("{0} is in check but it is not their move")]
    OpponentInCheck(Color),
    #[error("castling rights do not match the king and rook placement")]
    InvalidCastlingRights,
    #[error("en-passant target {0} does not follow a double pawn push")]
    InvalidEnPassant(Square),
    #[error("fullmove number must be at least 1")]
    InvalidFullmoveNumber,
    #[error("move history is inconsistent with the board at ply {ply}")]
    InconsistentHistory { ply: usize },
}

impl PositionError {
    pub fn code(&self) -> &'static str {
        "invalid_position"
    }
}

/// Rejections produced by the session coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("player has not joined this session")]
    UnknownPlayer,
    #[error("session already has two players")]
    SessionFull,
    #[error("no session with id {0}")]
    SessionNotFound(SessionId),
    #[error("malformed move request: {reason}")]
    MalformedMoveRequest { reason: String },
    #[error("the game is over ({status})")]
    GameOver { status: SessionStatus },
    #[error("waiting for an opponent to join")]
    AwaitingOpponent,
    #[error("session limit of {limit} reached")]
    CapacityExceeded { limit: usize },
    #[error(transparent)]
    InvalidPosition(#[from] PositionError),
}

impl SessionError {
    pub fn malformed<S: Into<String>>(reason: S) -> SessionError {
        SessionError::MalformedMoveRequest {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Rules(err) => err.code(),
            SessionError::NotYourTurn => "not_your_turn",
            SessionError::UnknownPlayer => "unknown_player",
            SessionError::SessionFull => "session_full",
            SessionError::SessionNotFound(_) => "session_not_found",
            SessionError::MalformedMoveRequest { .. } => "malformed_move_request",
            SessionError::GameOver { .. } => "game_over",
            SessionError::AwaitingOpponent => "awaiting_opponent",
            SessionError::CapacityExceeded { .. } => "capacity_exceeded",
            SessionError::InvalidPosition(err) => err.code(),
        }
    }

    /// The illegal-move reason carried by this error, if it is an illegal move rejection.
    pub fn illegal_move_reason(&self) -> Option<IllegalMoveReason> {
        match self {
            SessionError::Rules(RulesError::IllegalMove { reason }) => Some(*reason),
            _ => None,
        }
    }
}

/// Failures loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!("illegal_move", RulesError::illegal(IllegalMoveReason::BlockedPath).code());
        assert_eq!(
            "missing_promotion_choice",
            SessionError::from(RulesError::MissingPromotionChoice).code()
        );
        assert_eq!("not_your_turn", SessionError::NotYourTurn.code());
        assert_eq!("session_full", SessionError::SessionFull.code());
        assert_eq!(
            "malformed_move_request",
            SessionError::malformed("missing from_row").code()
        );
        assert_eq!(
            "invalid_position",
            SessionError::from(PositionError::MissingKing(Color::White)).code()
        );
    }

    #[test]
    fn messages() {
        let err = RulesError::illegal(IllegalMoveReason::LeavesKingInCheck);
        assert_eq!("illegal move: leaves-king-in-check", err.to_string());

        let err = SessionError::from(err);
        assert_eq!("illegal move: leaves-king-in-check", err.to_string());
        assert_eq!(
            Some(IllegalMoveReason::LeavesKingInCheck),
            err.illegal_move_reason()
        );
        assert_eq!(None, SessionError::UnknownPlayer.illegal_move_reason());
    }

    #[test]
    fn reason_serializes_kebab_case() {
        let text = serde_json::to_string(&IllegalMoveReason::WrongPieceMovement).unwrap();
        assert_eq!("\"wrong-piece-movement\"", text);
    }
}
