// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The rules engine. Every function here is pure: positions go in by
//! reference and new positions come out, so a rejected move can never leave
//! a half-applied board behind.
//!
//! Legality is decided in two steps. The move generator produces
//! pseudo-legal moves, and each of them is played on a scratch copy of the
//! position and kept only if the mover's king is not attacked afterwards.
//! Castles additionally require that the king is not in check to begin with
//! and does not pass over an attacked square.
//!
//! Positions passed in must satisfy `Position::validate`. Every position that
//! comes out of deserialization, `Position::from_fen_checked` or a previous
//! rules call does; a raw `Position::from_fen` result may not.
use std::fmt;

use crate::attacks;
use crate::bitboard::{Bitboard, BB_DARK_SQUARES, BB_LIGHT_SQUARES};
use crate::error::{IllegalMoveReason, RulesError};
use crate::move_generator::{MoveGenerator, MoveVec};
use crate::moves::Move;
use crate::position::Position;
use crate::types::{CastleStatus, Color, Direction, File, PieceKind, Rank, Square};

/// The state of the game from the point of view of the side to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
    DrawFiftyMove,
    DrawRepetition,
    DrawInsufficientMaterial,
}

impl GameStatus {
    /// Whether the game cannot continue from this position.
    pub fn is_terminal(self) -> bool {
        match self {
            GameStatus::InProgress | GameStatus::Check => false,
            _ => true,
        }
    }

    pub fn is_draw(self) -> bool {
        match self {
            GameStatus::Stalemate
            | GameStatus::DrawFiftyMove
            | GameStatus::DrawRepetition
            | GameStatus::DrawInsufficientMaterial => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::DrawFiftyMove => "draw_fifty_move",
            GameStatus::DrawRepetition => "draw_repetition",
            GameStatus::DrawInsufficientMaterial => "draw_insufficient_material",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every legal move for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut moves = MoveVec::default();
    generate_legal_moves(pos, &mut moves);
    moves.into_iter().collect()
}

/// Fills `moves` with the legal moves for the side to move.
pub fn generate_legal_moves(pos: &Position, moves: &mut MoveVec) {
    let mut pseudo_legal = MoveVec::default();
    MoveGenerator::new().generate_moves(pos, &mut pseudo_legal);
    let mut scratch = pos.clone();
    for mov in pseudo_legal {
        if is_legal_given_pseudolegal(&mut scratch, mov) {
            moves.push(mov);
        }
    }
}

fn has_legal_move(pos: &Position) -> bool {
    let mut pseudo_legal = MoveVec::default();
    MoveGenerator::new().generate_moves(pos, &mut pseudo_legal);
    let mut scratch = pos.clone();
    pseudo_legal
        .into_iter()
        .any(|mov| is_legal_given_pseudolegal(&mut scratch, mov))
}

/// Legality test for a move known to be pseudo-legal in `scratch`. The move is played and taken
/// back, so `scratch` is unchanged on return.
fn is_legal_given_pseudolegal(scratch: &mut Position, mov: Move) -> bool {
    let side = scratch.side_to_move();
    if mov.is_castle {
        let passed = if mov.is_kingside_castle() {
            mov.from.towards(Direction::East)
        } else {
            mov.from.towards(Direction::West)
        };

        if scratch.is_check(side) || scratch.is_attacked(side.toggle(), passed) {
            return false;
        }
    }

    scratch.make_move(mov);
    let legal = !scratch.is_check(side);
    scratch.unmake_move();
    legal
}

pub fn is_legal(pos: &Position, mov: Move) -> bool {
    legal_moves(pos).contains(&mov)
}

/// Resolves a submitted move to the legal move it names.
///
/// Moves are matched on source, destination and promotion. The castle and en-passant flags may
/// be left unset and are filled in from the matching legal move, but a flag that is set must
/// agree with it, as must the declared piece kind.
pub fn resolve_move(pos: &Position, mov: Move) -> Result<Move, RulesError> {
    let legal = legal_moves(pos);
    if let Some(&candidate) = legal.iter().find(|candidate| candidate.same_squares(mov)) {
        if candidate.piece != mov.piece
            || (mov.is_castle && !candidate.is_castle)
            || (mov.is_en_passant && !candidate.is_en_passant)
        {
            return Err(RulesError::illegal(IllegalMoveReason::WrongPieceMovement));
        }

        return Ok(candidate);
    }

    // A legal move with the same squares that did not match must be a promotion.
    let needs_promotion = legal
        .iter()
        .any(|candidate| candidate.from == mov.from && candidate.to == mov.to);
    if needs_promotion && mov.promotion.is_none() && mov.piece == PieceKind::Pawn {
        return Err(RulesError::MissingPromotionChoice);
    }

    Err(RulesError::illegal(diagnose(pos, mov)))
}

/// Applies a move, returning the position after it. The input position is never modified; on
/// failure the caller still holds the position exactly as it was.
pub fn apply_move(pos: &Position, mov: Move) -> Result<Position, RulesError> {
    let canonical = resolve_move(pos, mov)?;
    let mut next = pos.clone();
    next.make_move(canonical);
    Ok(next)
}

/// Takes back the last move in the position's history.
pub fn undo_move(pos: &Position) -> Result<Position, RulesError> {
    let mut prev = pos.clone();
    match prev.unmake_move() {
        Some(_) => Ok(prev),
        None => Err(RulesError::NothingToUndo),
    }
}

pub fn game_status(pos: &Position) -> GameStatus {
    let in_check = pos.is_check(pos.side_to_move());
    if !has_legal_move(pos) {
        return if in_check {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }

    if is_insufficient_material(pos) {
        return GameStatus::DrawInsufficientMaterial;
    }

    if pos.halfmove_clock() >= 100 {
        return GameStatus::DrawFiftyMove;
    }

    if pos.repetition_count() >= 3 {
        return GameStatus::DrawRepetition;
    }

    if in_check {
        GameStatus::Check
    } else {
        GameStatus::InProgress
    }
}

/// Whether neither side has the material to ever deliver mate: bare kings, a single minor
/// piece, or bishops that all travel on squares of one color.
pub fn is_insufficient_material(pos: &Position) -> bool {
    let mut knights = Bitboard::none();
    let mut bishops = Bitboard::none();
    for &color in &[Color::White, Color::Black] {
        let heavy = pos.pieces_of_kind(color, PieceKind::Pawn)
            | pos.pieces_of_kind(color, PieceKind::Rook)
            | pos.pieces_of_kind(color, PieceKind::Queen);
        if !heavy.empty() {
            return false;
        }

        knights |= pos.pieces_of_kind(color, PieceKind::Knight);
        bishops |= pos.pieces_of_kind(color, PieceKind::Bishop);
    }

    if (knights | bishops).count() <= 1 {
        return true;
    }

    knights.empty() && ((bishops & BB_LIGHT_SQUARES).empty() || (bishops & BB_DARK_SQUARES).empty())
}

/// Explains why a move that matched no legal move was rejected. Checks run from the coarsest
/// problem to the finest, so a move gets the first reason that applies.
fn diagnose(pos: &Position, mov: Move) -> IllegalMoveReason {
    let side = pos.side_to_move();
    let piece = match pos.piece_at(mov.from) {
        Some(piece) if mov.from != mov.to => piece,
        _ => return IllegalMoveReason::MalformedSquare,
    };

    if piece.color != side {
        return IllegalMoveReason::NotYourTurn;
    }

    if piece.kind != mov.piece
        || (mov.is_castle && piece.kind != PieceKind::King)
        || (mov.is_en_passant && piece.kind != PieceKind::Pawn)
    {
        return IllegalMoveReason::WrongPieceMovement;
    }

    if let Some(kind) = mov.promotion {
        if piece.kind != PieceKind::Pawn
            || !kind.is_promotion_target()
            || mov.to.rank() != Rank::promotion(side)
        {
            return IllegalMoveReason::WrongPieceMovement;
        }
    }

    if pos.pieces(side).test(mov.to) {
        return IllegalMoveReason::BlockedPath;
    }

    let occupancy = pos.occupancy();
    let geometry = match piece.kind {
        PieceKind::Bishop => slider_geometry(attacks::bishop_attacks, mov, occupancy),
        PieceKind::Rook => slider_geometry(attacks::rook_attacks, mov, occupancy),
        PieceKind::Queen => slider_geometry(attacks::queen_attacks, mov, occupancy),
        PieceKind::Knight => leaper_geometry(attacks::knight_attacks(mov.from), mov),
        PieceKind::Pawn => pawn_geometry(pos, side, mov),
        PieceKind::King => king_geometry(pos, side, mov),
    };
    if let Err(reason) = geometry {
        return reason;
    }

    // The move is a possible movement of the piece. If the generator offers it in any form, the
    // only thing wrong with it is the king it exposes.
    let mut pseudo_legal = MoveVec::default();
    MoveGenerator::new().generate_moves(pos, &mut pseudo_legal);
    if pseudo_legal
        .iter()
        .any(|candidate| candidate.from == mov.from && candidate.to == mov.to)
    {
        return IllegalMoveReason::LeavesKingInCheck;
    }

    IllegalMoveReason::WrongPieceMovement
}

type Geometry = Result<(), IllegalMoveReason>;

fn slider_geometry<F>(rays: F, mov: Move, occupancy: Bitboard) -> Geometry
where
    F: Fn(Square, Bitboard) -> Bitboard,
{
    if !rays(mov.from, Bitboard::none()).test(mov.to) {
        return Err(IllegalMoveReason::WrongPieceMovement);
    }

    if !rays(mov.from, occupancy).test(mov.to) {
        return Err(IllegalMoveReason::BlockedPath);
    }

    Ok(())
}

fn leaper_geometry(targets: Bitboard, mov: Move) -> Geometry {
    if targets.test(mov.to) {
        Ok(())
    } else {
        Err(IllegalMoveReason::WrongPieceMovement)
    }
}

fn pawn_geometry(pos: &Position, side: Color, mov: Move) -> Geometry {
    let occupancy = pos.occupancy();
    let forward = side.pawn_direction();
    let start_rank = match side {
        Color::White => Rank::Two,
        Color::Black => Rank::Seven,
    };

    if attacks::pawn_attacks(mov.from, side).test(mov.to) {
        let captures_en_passant = Some(mov.to) == pos.en_passant_square();
        if mov.is_en_passant && !captures_en_passant {
            return Err(IllegalMoveReason::WrongPieceMovement);
        }

        if !occupancy.test(mov.to) && !captures_en_passant {
            return Err(IllegalMoveReason::WrongPieceMovement);
        }

        return Ok(());
    }

    if mov.is_en_passant {
        return Err(IllegalMoveReason::WrongPieceMovement);
    }

    let single = mov.from.try_towards(forward);
    let double = single.and_then(|sq| sq.try_towards(forward));
    if single == Some(mov.to) {
        if occupancy.test(mov.to) {
            return Err(IllegalMoveReason::BlockedPath);
        }

        return Ok(());
    }

    if double == Some(mov.to) && mov.from.rank() == start_rank {
        let blocked = single.map_or(false, |sq| occupancy.test(sq)) || occupancy.test(mov.to);
        if blocked {
            return Err(IllegalMoveReason::BlockedPath);
        }

        return Ok(());
    }

    Err(IllegalMoveReason::WrongPieceMovement)
}

fn king_geometry(pos: &Position, side: Color, mov: Move) -> Geometry {
    let home = Square::of(Rank::back(side), File::E);
    let castle_wing = if mov.from == home && mov.to == Square::of(Rank::back(side), File::G) {
        Some((CastleStatus::kingside(side), File::H))
    } else if mov.from == home && mov.to == Square::of(Rank::back(side), File::C) {
        Some((CastleStatus::queenside(side), File::A))
    } else {
        None
    };

    let (right, rook_file) = match castle_wing {
        Some(wing) => wing,
        None if mov.is_castle => return Err(IllegalMoveReason::WrongPieceMovement),
        None => return leaper_geometry(attacks::king_attacks(mov.from), mov),
    };

    let rook = Square::of(Rank::back(side), rook_file);
    if !pos.castle_status().contains(right)
        || !pos.pieces_of_kind(side, PieceKind::Rook).test(rook)
    {
        return Err(IllegalMoveReason::WrongPieceMovement);
    }

    // Everything strictly between king and rook must be empty.
    let rook_path = attacks::rook_attacks(mov.from, pos.occupancy());
    if !rook_path.test(rook) {
        return Err(IllegalMoveReason::BlockedPath);
    }

    Ok(())
}
