// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use rayon::prelude::*;

use crate::move_generator::MoveVec;
use crate::position::Position;
use crate::rules;

/// Counts the leaf nodes of the legal move tree of `pos` to `depth` plies. Subtrees are searched
/// in parallel.
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveVec::default();
    rules::generate_legal_moves(pos, &mut moves);
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .par_iter()
        .map(|&mov| {
            let mut next = pos.clone();
            next.make_move(mov);
            perft(&next, depth - 1)
        })
        .sum()
}
