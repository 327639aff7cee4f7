// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Attack sets for every piece kind. Non-sliding pieces are served from
//! tables computed once on first use; sliding pieces walk precomputed rays
//! and cut each ray off at its first blocker.
use crate::bitboard::Bitboard;
use crate::bitboard::{
    BB_FILE_A, BB_FILE_AB, BB_FILE_GH, BB_FILE_H, BB_RANK_1, BB_RANK_12, BB_RANK_78, BB_RANK_8,
};
use crate::types::{Color, Direction, Square, TableIndex, COLORS, SQUARES};

static DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

// Knight jumps as (offset, squares the jump may not start from).
static KNIGHT_JUMPS: [(i32, Bitboard); 8] = [
    (17, BB_RANK_78.or(BB_FILE_H)),
    (15, BB_RANK_78.or(BB_FILE_A)),
    (10, BB_RANK_8.or(BB_FILE_GH)),
    (6, BB_RANK_8.or(BB_FILE_AB)),
    (-6, BB_RANK_1.or(BB_FILE_GH)),
    (-10, BB_RANK_1.or(BB_FILE_AB)),
    (-15, BB_RANK_12.or(BB_FILE_H)),
    (-17, BB_RANK_12.or(BB_FILE_A)),
];

struct AttackTables {
    king: [Bitboard; 64],
    knight: [Bitboard; 64],
    pawn: [[Bitboard; 2]; 64],
    // Indexed by square, then direction. The extra 65th row is an empty sentinel so that
    // "no blocker" lookups need no branch.
    rays: [[Bitboard; 8]; 65],
}

impl AttackTables {
    fn new() -> AttackTables {
        let mut tables = AttackTables {
            king: [Bitboard::none(); 64],
            knight: [Bitboard::none(); 64],
            pawn: [[Bitboard::none(); 2]; 64],
            rays: [[Bitboard::none(); 8]; 65],
        };

        for &sq in SQUARES.iter() {
            let idx = sq.as_index();
            for &dir in DIRECTIONS.iter() {
                if let Some(target) = sq.try_towards(dir) {
                    tables.king[idx].set(target);
                }

                let mut ray = Bitboard::none();
                let mut cursor = sq;
                while let Some(next) = cursor.try_towards(dir) {
                    ray.set(next);
                    cursor = next;
                }
                tables.rays[idx][dir.as_index()] = ray;
            }

            for &(offset, forbidden) in KNIGHT_JUMPS.iter() {
                if !forbidden.test(sq) {
                    tables.knight[idx].set(sq.plus(offset));
                }
            }

            for &color in COLORS.iter() {
                let forward = color.pawn_direction();
                let mut board = Bitboard::none();
                if let Some(ahead) = sq.try_towards(forward) {
                    for &side in &[Direction::East, Direction::West] {
                        if let Some(target) = ahead.try_towards(side) {
                            board.set(target);
                        }
                    }
                }
                tables.pawn[idx][color.as_index()] = board;
            }
        }

        tables
    }

    fn ray(&self, sq: usize, dir: Direction) -> Bitboard {
        self.rays[sq][dir.as_index()]
    }
}

lazy_static! {
    static ref TABLES: AttackTables = AttackTables::new();
}

// Rays pointing towards higher square numbers meet their nearest blocker at the lowest set bit.
fn positive_ray_attacks(sq: Square, occupancy: Bitboard, dir: Direction) -> Bitboard {
    debug_assert!(dir.as_vector() > 0);
    let attacks = TABLES.ray(sq.as_index(), dir);
    let blocker = attacks.and(occupancy).bits();
    let blocking_square = blocker.trailing_zeros() as usize;
    attacks.xor(TABLES.ray(blocking_square, dir))
}

// ...and rays pointing the other way meet theirs at the highest set bit.
fn negative_ray_attacks(sq: Square, occupancy: Bitboard, dir: Direction) -> Bitboard {
    debug_assert!(dir.as_vector() < 0);
    let attacks = TABLES.ray(sq.as_index(), dir);
    let blocker = attacks.and(occupancy).bits();
    let blocking_square = if blocker == 0 {
        64
    } else {
        63 - blocker.leading_zeros() as usize
    };
    attacks.xor(TABLES.ray(blocking_square, dir))
}

pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    TABLES.pawn[sq.as_index()][color.as_index()]
}

pub fn knight_attacks(sq: Square) -> Bitboard {
    TABLES.knight[sq.as_index()]
}

pub fn king_attacks(sq: Square) -> Bitboard {
    TABLES.king[sq.as_index()]
}

pub fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    positive_ray_attacks(sq, occupancy, Direction::NorthEast)
        | positive_ray_attacks(sq, occupancy, Direction::NorthWest)
        | negative_ray_attacks(sq, occupancy, Direction::SouthEast)
        | negative_ray_attacks(sq, occupancy, Direction::SouthWest)
}

pub fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    positive_ray_attacks(sq, occupancy, Direction::North)
        | positive_ray_attacks(sq, occupancy, Direction::East)
        | negative_ray_attacks(sq, occupancy, Direction::South)
        | negative_ray_attacks(sq, occupancy, Direction::West)
}

pub fn queen_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupancy) | rook_attacks(sq, occupancy)
}
