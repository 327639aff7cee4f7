// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chessroom::rules;
use chessroom::{
    Color, GameStatus, IllegalMoveReason, Move, PieceKind, Position, RulesError, Square,
};

const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

fn all_squares() -> Vec<Square> {
    (0..8)
        .flat_map(|row| (0..8).filter_map(move |col| Square::from_coords(row, col)))
        .collect()
}

fn play(moves: &[&str]) -> Position {
    let mut pos = Position::from_start_position();
    for text in moves {
        let mov = pos.move_from_uci(text).unwrap();
        pos = rules::apply_move(&pos, mov).unwrap();
    }
    pos
}

#[test]
fn every_legal_move_applies_and_keeps_the_king_safe() {
    for fen in POSITIONS {
        let pos = Position::from_fen(fen).unwrap();
        let mover = pos.side_to_move();
        for mov in rules::legal_moves(&pos) {
            let next = rules::apply_move(&pos, mov).unwrap();
            assert!(!next.is_check(mover), "{} leaves the king in check", mov);
            assert_eq!(mover.toggle(), next.side_to_move());
            assert_eq!(Some(mov), next.last_move());
        }
    }
}

#[test]
fn moves_outside_the_legal_set_are_rejected_untouched() {
    for fen in POSITIONS {
        let pos = Position::from_fen(fen).unwrap();
        let before = pos.clone();
        let legal = rules::legal_moves(&pos);
        for from in all_squares() {
            for to in all_squares() {
                let piece = match pos.piece_at(from) {
                    Some(piece) => piece.kind,
                    None => PieceKind::Pawn,
                };
                let mov = Move::new(from, to, piece);
                if legal.iter().any(|legal| legal.same_squares(mov)) {
                    continue;
                }

                match rules::apply_move(&pos, mov) {
                    Err(RulesError::IllegalMove { .. }) | Err(RulesError::MissingPromotionChoice) => {}
                    other => panic!("{} in {} gave {:?}", mov, fen, other),
                }
                assert_eq!(before, pos);
            }
        }
    }
}

#[test]
fn serialization_round_trips() {
    let games: Vec<Position> = vec![
        Position::from_start_position(),
        play(&["e2e4", "d7d5", "e4d5", "g8f6", "f1b5", "c7c6", "d5c6", "d8d2"]),
        play(&["e2e4", "a7a6", "e4e5", "d7d5"]),
        Position::from_fen(POSITIONS[3]).unwrap(),
    ];

    for pos in games {
        let text = serde_json::to_string(&pos).unwrap();
        let parsed: Position = serde_json::from_str(&text).unwrap();
        assert_eq!(pos, parsed);
        assert_eq!(pos.as_fen(), parsed.as_fen());
        assert_eq!(pos.history(), parsed.history());
    }
}

#[test]
fn king_pawn_opening() {
    let pos = play(&["e2e4"]);
    assert_eq!(Color::Black, pos.side_to_move());
    assert_eq!(Some(Square::E3), pos.en_passant_square());
    assert_eq!(GameStatus::InProgress, rules::game_status(&pos));
}

#[test]
fn white_cannot_move_twice() {
    let pos = play(&["e2e4"]);
    let err = rules::apply_move(&pos, Move::new(Square::D2, Square::D4, PieceKind::Pawn));
    assert_eq!(
        Err(RulesError::illegal(IllegalMoveReason::NotYourTurn)),
        err
    );
}

#[test]
fn fools_mate() {
    let pos = play(&["f2f3", "e7e5", "g2g4", "d8h4"]);
    assert_eq!(GameStatus::Checkmate, rules::game_status(&pos));
    assert!(rules::legal_moves(&pos).is_empty());
}

#[test]
fn castling_through_an_attacked_square() {
    // the black rook on f8 covers f1
    let pos = Position::from_fen("4kr2/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    assert_eq!(
        Err(RulesError::illegal(IllegalMoveReason::LeavesKingInCheck)),
        rules::apply_move(&pos, Move::castle(Square::E1, Square::G1))
    );
}

#[test]
fn undo_restores_every_field() {
    let before = play(&["e2e4", "d7d5"]);
    let after = rules::apply_move(&before, Move::new(Square::E4, Square::D5, PieceKind::Pawn))
        .unwrap();
    assert_eq!(before, rules::undo_move(&after).unwrap());
    assert_eq!(
        Err(RulesError::NothingToUndo),
        rules::undo_move(&Position::from_start_position())
    );
}

#[test]
fn knight_dance_repeats() {
    let pos = play(&[
        "g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8",
    ]);
    assert_eq!(GameStatus::DrawRepetition, rules::game_status(&pos));
}

#[test]
fn castling_with_a_clear_path() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    let castle = Move::castle(Square::E1, Square::G1);
    assert!(rules::is_legal(&pos, castle));

    // a bare king move to g1 names the castle too
    let next = rules::apply_move(&pos, Move::new(Square::E1, Square::G1, PieceKind::King)).unwrap();
    assert_eq!(Some(castle), next.last_move());
    assert_eq!(Some(Square::G1), next.king_square(Color::White));
    assert_eq!(
        Some(PieceKind::Rook),
        next.piece_at(Square::F1).map(|piece| piece.kind)
    );
    assert!(!next.can_castle_kingside(Color::White));
}
