// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pseudo-legal move generation. The generator produces every move that
//! obeys the movement rules of the moving piece without regard to whether
//! the move leaves the mover's own king in check; `rules` filters the result
//! down to legal moves.
//!
//! Castles are generated whenever the castle right is intact and the squares
//! between king and rook are empty. Whether the king starts in, passes
//! through or lands on an attacked square is a legality question and is
//! answered by the legality filter.
use arrayvec::ArrayVec;

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::moves::Move;
use crate::position::Position;
use crate::types::{CastleStatus, Color, Direction, File, PieceKind, Rank, Square};
use crate::types::PROMOTION_KINDS;

/// No chess position has more than 218 legal moves, and the pseudo-legal
/// count stays comfortably below this bound.
pub type MoveVec = ArrayVec<[Move; 256]>;

#[derive(Copy, Clone, Debug, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> MoveGenerator {
        MoveGenerator
    }

    /// Generates all pseudo-legal moves for the side to move and appends them to `moves`.
    pub fn generate_moves(&self, pos: &Position, moves: &mut MoveVec) {
        let color = pos.side_to_move();
        self.generate_pawn_moves(pos, color, moves);
        self.generate_leaper_moves(pos, color, PieceKind::Knight, moves);
        self.generate_sliding_moves(pos, color, PieceKind::Bishop, moves);
        self.generate_sliding_moves(pos, color, PieceKind::Rook, moves);
        self.generate_sliding_moves(pos, color, PieceKind::Queen, moves);
        self.generate_leaper_moves(pos, color, PieceKind::King, moves);
        self.generate_castles(pos, color, moves);
    }

    fn generate_pawn_moves(&self, pos: &Position, color: Color, moves: &mut MoveVec) {
        let enemy_pieces = pos.pieces(color.toggle());
        let occupancy = pos.occupancy();
        let forward = color.pawn_direction();
        let start_rank = match color {
            Color::White => Rank::Two,
            Color::Black => Rank::Seven,
        };

        for pawn in pos.pieces_of_kind(color, PieceKind::Pawn) {
            // Pawns never stand on their promotion rank, so one step forward is always on the
            // board.
            let target = match pawn.try_towards(forward) {
                Some(target) => target,
                None => continue,
            };

            if !occupancy.test(target) {
                push_pawn_move(pawn, target, color, moves);
                if pawn.rank() == start_rank {
                    let double_target = target.towards(forward);
                    if !occupancy.test(double_target) {
                        moves.push(Move::new(pawn, double_target, PieceKind::Pawn));
                    }
                }
            }

            let pawn_attacks = attacks::pawn_attacks(pawn, color);
            for capture in pawn_attacks & enemy_pieces {
                push_pawn_move(pawn, capture, color, moves);
            }

            if let Some(ep_square) = pos.en_passant_square() {
                if pawn_attacks.test(ep_square) {
                    moves.push(Move::en_passant(pawn, ep_square));
                }
            }
        }
    }

    fn generate_leaper_moves(
        &self,
        pos: &Position,
        color: Color,
        kind: PieceKind,
        moves: &mut MoveVec,
    ) {
        let allied_pieces = pos.pieces(color);
        for piece in pos.pieces_of_kind(color, kind) {
            let targets = match kind {
                PieceKind::Knight => attacks::knight_attacks(piece),
                _ => attacks::king_attacks(piece),
            };

            for target in targets.without(allied_pieces) {
                moves.push(Move::new(piece, target, kind));
            }
        }
    }

    fn generate_sliding_moves(
        &self,
        pos: &Position,
        color: Color,
        kind: PieceKind,
        moves: &mut MoveVec,
    ) {
        let allied_pieces = pos.pieces(color);
        let occupancy = pos.occupancy();
        for piece in pos.pieces_of_kind(color, kind) {
            let targets = match kind {
                PieceKind::Bishop => attacks::bishop_attacks(piece, occupancy),
                PieceKind::Rook => attacks::rook_attacks(piece, occupancy),
                _ => attacks::queen_attacks(piece, occupancy),
            };

            for target in targets.without(allied_pieces) {
                moves.push(Move::new(piece, target, kind));
            }
        }
    }

    fn generate_castles(&self, pos: &Position, color: Color, moves: &mut MoveVec) {
        let king = Square::of(Rank::back(color), File::E);
        if !pos.pieces_of_kind(color, PieceKind::King).test(king) {
            return;
        }

        let rooks = pos.pieces_of_kind(color, PieceKind::Rook);
        let occupancy = pos.occupancy();
        for &(right, direction, distance) in &[
            (CastleStatus::kingside(color), Direction::East, 3),
            (CastleStatus::queenside(color), Direction::West, 4),
        ] {
            if !pos.castle_status().contains(right) {
                continue;
            }

            let rook = king.plus(direction.as_vector() * distance);
            if !rooks.test(rook) || !between(king, rook, direction).and(occupancy).empty() {
                continue;
            }

            let destination = king.towards(direction).towards(direction);
            moves.push(Move::castle(king, destination));
        }
    }
}

/// The squares strictly between `from` and `to`, walking in `direction`.
fn between(from: Square, to: Square, direction: Direction) -> Bitboard {
    let mut squares = Bitboard::none();
    let mut cursor = from.towards(direction);
    while cursor != to {
        squares.set(cursor);
        cursor = cursor.towards(direction);
    }

    squares
}

fn push_pawn_move(from: Square, to: Square, color: Color, moves: &mut MoveVec) {
    if to.rank() == Rank::promotion(color) {
        for &kind in &PROMOTION_KINDS {
            moves.push(Move::promotion(from, to, kind));
        }
    } else {
        moves.push(Move::new(from, to, PieceKind::Pawn));
    }
}

#[cfg(test)]
mod tests {
    use super::{MoveGenerator, MoveVec};
    use crate::moves::Move;
    use crate::position::Position;
    use crate::types::{PieceKind, Square};

    fn generate(fen: &'static str) -> MoveVec {
        let pos = Position::from_fen(fen).unwrap();
        let mut moves = MoveVec::default();
        MoveGenerator::new().generate_moves(&pos, &mut moves);
        moves
    }

    #[test]
    fn start_position_has_twenty() {
        let moves = generate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(20, moves.len());
        assert!(moves.contains(&Move::new(Square::E2, Square::E4, PieceKind::Pawn)));
        assert!(moves.contains(&Move::new(Square::G1, Square::F3, PieceKind::Knight)));
    }

    #[test]
    fn blocked_pawn_has_no_push() {
        let moves = generate("4k3/8/8/8/8/4p3/4P3/4K3 w - - 0 1");
        assert!(!moves
            .iter()
            .any(|m| m.from == Square::E2 && m.piece == PieceKind::Pawn));
    }

    #[test]
    fn double_push_needs_both_squares() {
        let moves = generate("4k3/8/8/8/4p3/8/4P3/K7 w - - 0 1");
        assert!(moves.contains(&Move::new(Square::E2, Square::E3, PieceKind::Pawn)));
        assert!(!moves.contains(&Move::new(Square::E2, Square::E4, PieceKind::Pawn)));
    }

    #[test]
    fn promotions_offer_four_kinds() {
        let moves = generate("3nk3/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let promotions: Vec<_> = moves.iter().filter(|m| m.is_promotion()).collect();
        // e8 is blocked by the king, leaving the capture on d8 in four flavors
        assert_eq!(4, promotions.len());
        assert!(promotions.iter().all(|m| m.to == Square::D8));
    }

    #[test]
    fn en_passant_generated() {
        let moves = generate("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert!(moves.contains(&Move::en_passant(Square::E5, Square::D6)));
    }

    #[test]
    fn castles_need_rights_and_empty_path() {
        let moves = generate("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(moves.contains(&Move::castle(Square::E1, Square::G1)));
        assert!(moves.contains(&Move::castle(Square::E1, Square::C1)));

        let moves = generate("4k3/8/8/8/8/8/8/RN2K2R w K - 0 1");
        assert!(moves.contains(&Move::castle(Square::E1, Square::G1)));
        assert!(!moves.contains(&Move::castle(Square::E1, Square::C1)));

        let moves = generate("4k3/8/8/8/8/8/8/R3K1NR w KQ - 0 1");
        assert!(!moves.contains(&Move::castle(Square::E1, Square::G1)));
    }

    #[test]
    fn sliders_stop_at_first_piece() {
        let moves = generate("4k3/8/8/8/3p4/8/3R4/4K3 w - - 0 1");
        assert!(moves.contains(&Move::new(Square::D2, Square::D4, PieceKind::Rook)));
        assert!(!moves.contains(&Move::new(Square::D2, Square::D5, PieceKind::Rook)));
        assert!(!moves.contains(&Move::new(Square::D2, Square::E1, PieceKind::Rook)));
    }
}
