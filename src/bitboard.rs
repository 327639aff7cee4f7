// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `Bitboard` is a set of squares packed into a single 64-bit integer, one
//! bit per square (A1 is the least significant bit). The position keeps one
//! bitboard per piece kind and color, and attack and move generation work
//! entirely in terms of bitboard intersections and unions.
use num_traits::FromPrimitive;
use std::fmt;
use std::ops;

use crate::types::{self, File, Rank, Square};

const RANK_1_MASK: u64 = 0x0000_0000_0000_00FF;
const FILE_A_MASK: u64 = 0x0101_0101_0101_0101;
const LIGHT_SQUARES_MASK: u64 = 0x55AA_55AA_55AA_55AA;

#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bitboard {
    bits: u64,
}

impl Bitboard {
    pub const fn from_bits(bits: u64) -> Bitboard {
        Bitboard { bits }
    }

    /// The set of every square.
    pub const fn all() -> Bitboard {
        Bitboard::from_bits(!0)
    }

    /// The empty set.
    pub const fn none() -> Bitboard {
        Bitboard::from_bits(0)
    }

    /// A set containing only `square`.
    pub const fn single(square: Square) -> Bitboard {
        Bitboard::from_bits(1u64 << (square as u8))
    }

    pub const fn test(self, square: Square) -> bool {
        (self.bits & (1u64 << (square as u8))) != 0
    }

    pub fn set(&mut self, square: Square) {
        self.bits |= 1u64 << (square as u8);
    }

    pub fn unset(&mut self, square: Square) {
        self.bits &= !(1u64 << square as u8);
    }

    pub const fn and(self, other: Bitboard) -> Bitboard {
        Bitboard::from_bits(self.bits & other.bits)
    }

    pub const fn or(self, other: Bitboard) -> Bitboard {
        Bitboard::from_bits(self.bits | other.bits)
    }

    pub const fn xor(self, other: Bitboard) -> Bitboard {
        Bitboard::from_bits(self.bits ^ other.bits)
    }

    /// Set difference: the squares of `self` that are not in `other`.
    pub const fn without(self, other: Bitboard) -> Bitboard {
        Bitboard::from_bits(self.bits & !other.bits)
    }

    pub fn iter(self) -> BitboardIterator {
        BitboardIterator { bits: self.bits }
    }

    /// The members of this set that lie on the given rank.
    pub fn rank(self, rank: Rank) -> Bitboard {
        self.and(Bitboard::from_bits(RANK_1_MASK << (8 * rank as u32)))
    }

    /// The members of this set that lie on the given file.
    pub fn file(self, file: File) -> Bitboard {
        self.and(Bitboard::from_bits(FILE_A_MASK << file as u32))
    }

    pub const fn bits(self) -> u64 {
        self.bits
    }

    pub const fn count(self) -> u32 {
        self.bits.count_ones()
    }

    pub const fn empty(self) -> bool {
        self.bits == 0
    }

    /// The lowest-numbered square in the set, if any.
    pub fn first(self) -> Option<Square> {
        self.into_iter().next()
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Bitboard")
            .field(&format_args!("{:#018x}", self.bits))
            .finish()
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &rank in types::RANKS.iter().rev() {
            for &file in &types::FILES {
                let mark = if self.test(Square::of(rank, file)) {
                    '1'
                } else {
                    '.'
                };
                write!(f, " {} ", mark)?;
            }

            writeln!(f, "| {}", rank)?;
        }

        for file in &types::FILES {
            write!(f, " {} ", file)?;
        }

        writeln!(f)
    }
}

impl ops::BitAnd for Bitboard {
    type Output = Bitboard;

    fn bitand(self, rhs: Bitboard) -> Bitboard {
        self.and(rhs)
    }
}

impl ops::BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Bitboard) {
        *self = self.and(rhs);
    }
}

impl ops::BitOr for Bitboard {
    type Output = Bitboard;

    fn bitor(self, rhs: Bitboard) -> Bitboard {
        self.or(rhs)
    }
}

impl ops::BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Bitboard) {
        *self = self.or(rhs);
    }
}

impl ops::BitXor for Bitboard {
    type Output = Bitboard;

    fn bitxor(self, rhs: Bitboard) -> Bitboard {
        self.xor(rhs)
    }
}

impl ops::Not for Bitboard {
    type Output = Bitboard;

    fn not(self) -> Bitboard {
        Bitboard::from_bits(!self.bits)
    }
}

/// Iterates the squares of a bitboard from A1 towards H8.
pub struct BitboardIterator {
    bits: u64,
}

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.bits == 0 {
            return None;
        }

        let next = self.bits.trailing_zeros();
        self.bits &= self.bits - 1;
        Some(FromPrimitive::from_u32(next).unwrap())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bits.count_ones() as usize;
        (remaining, Some(remaining))
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIterator;

    fn into_iter(self) -> BitboardIterator {
        self.iter()
    }
}

pub const BB_RANK_1: Bitboard = Bitboard::from_bits(RANK_1_MASK);
pub const BB_RANK_2: Bitboard = Bitboard::from_bits(RANK_1_MASK << 8);
pub const BB_RANK_7: Bitboard = Bitboard::from_bits(RANK_1_MASK << 48);
pub const BB_RANK_8: Bitboard = Bitboard::from_bits(RANK_1_MASK << 56);

pub const BB_FILE_A: Bitboard = Bitboard::from_bits(FILE_A_MASK);
pub const BB_FILE_B: Bitboard = Bitboard::from_bits(FILE_A_MASK << 1);
pub const BB_FILE_G: Bitboard = Bitboard::from_bits(FILE_A_MASK << 6);
pub const BB_FILE_H: Bitboard = Bitboard::from_bits(FILE_A_MASK << 7);

pub const BB_FILE_AB: Bitboard = BB_FILE_A.or(BB_FILE_B);
pub const BB_FILE_GH: Bitboard = BB_FILE_G.or(BB_FILE_H);

pub const BB_RANK_12: Bitboard = BB_RANK_1.or(BB_RANK_2);
pub const BB_RANK_78: Bitboard = BB_RANK_7.or(BB_RANK_8);

pub const BB_LIGHT_SQUARES: Bitboard = Bitboard::from_bits(LIGHT_SQUARES_MASK);
pub const BB_DARK_SQUARES: Bitboard = Bitboard::from_bits(!LIGHT_SQUARES_MASK);
