// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Zobrist keys identify positions for repetition detection. Two positions
//! share a key when they agree on piece placement, side to move, castling
//! rights and en-passant file.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::position::Position;
use crate::types::{CastleStatus, Color, PieceKind, Square, TableIndex, COLORS, PIECE_KINDS};

const ZOBRIST_SEED: u64 = 0xf68e_34a4_e8cc_f09a;

struct ZobristKeys {
    // [color][kind][square]
    pieces: [[[u64; 64]; 6]; 2],
    black_to_move: u64,
    castling: [u64; 4],
    en_passant_file: [u64; 8],
}

impl ZobristKeys {
    fn new(seed: u64) -> ZobristKeys {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut keys = ZobristKeys {
            pieces: [[[0; 64]; 6]; 2],
            black_to_move: rng.gen(),
            castling: [0; 4],
            en_passant_file: [0; 8],
        };

        for color_table in keys.pieces.iter_mut() {
            for kind_table in color_table.iter_mut() {
                for entry in kind_table.iter_mut() {
                    *entry = rng.gen();
                }
            }
        }
        for entry in keys.castling.iter_mut() {
            *entry = rng.gen();
        }
        for entry in keys.en_passant_file.iter_mut() {
            *entry = rng.gen();
        }

        keys
    }

    fn piece(&self, color: Color, kind: PieceKind, square: Square) -> u64 {
        self.pieces[color.as_index()][kind.as_index()][square.as_index()]
    }
}

lazy_static! {
    static ref KEYS: ZobristKeys = ZobristKeys::new(ZOBRIST_SEED);
}

static CASTLE_FLAGS: [CastleStatus; 4] = [
    CastleStatus::WHITE_KINGSIDE,
    CastleStatus::WHITE_QUEENSIDE,
    CastleStatus::BLACK_KINGSIDE,
    CastleStatus::BLACK_QUEENSIDE,
];

/// Computes the key of a position from scratch.
pub fn hash(pos: &Position) -> u64 {
    let mut key = 0u64;
    for &color in &COLORS {
        for &kind in &PIECE_KINDS {
            for square in pos.pieces_of_kind(color, kind) {
                key ^= KEYS.piece(color, kind, square);
            }
        }
    }

    if pos.side_to_move() == Color::Black {
        key ^= KEYS.black_to_move;
    }

    let castle_status = pos.castle_status();
    for (idx, &flag) in CASTLE_FLAGS.iter().enumerate() {
        if castle_status.contains(flag) {
            key ^= KEYS.castling[idx];
        }
    }

    if let Some(ep_square) = pos.en_passant_square() {
        key ^= KEYS.en_passant_file[ep_square.file().as_index()];
    }

    key
}
