// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate criterion;

use chessroom::rules;
use chessroom::{Move, PieceKind, Position, Square};
use criterion::black_box;
use criterion::Criterion;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("legal moves start", |b| {
        let pos = Position::from_start_position();
        b.iter(|| rules::legal_moves(black_box(&pos)))
    });

    c.bench_function("legal moves kiwipete", |b| {
        let pos = Position::from_fen(KIWIPETE).unwrap();
        b.iter(|| rules::legal_moves(black_box(&pos)))
    });

    c.bench_function("apply e2e4", |b| {
        let pos = Position::from_start_position();
        let mov = Move::new(Square::E2, Square::E4, PieceKind::Pawn);
        b.iter(|| rules::apply_move(black_box(&pos), black_box(mov)))
    });

    c.bench_function("game status kiwipete", |b| {
        let pos = Position::from_fen(KIWIPETE).unwrap();
        b.iter(|| rules::game_status(black_box(&pos)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
