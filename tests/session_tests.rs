// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::{Arc, Barrier};
use std::thread;

use chessroom::{
    Color, Coordinator, GameStatus, IllegalMoveReason, Move, PieceKind, PlayerId, Position,
    SessionError, SessionId, SessionStatus, Square,
};

fn started(coordinator: &Coordinator) -> (SessionId, PlayerId, PlayerId) {
    let id = coordinator.create_session().unwrap();
    let white = PlayerId::from("white-player");
    let black = PlayerId::from("black-player");
    assert_eq!(Ok(Color::White), coordinator.join_session(id, &white));
    assert_eq!(Ok(Color::Black), coordinator.join_session(id, &black));
    (id, white, black)
}

fn uci(coordinator: &Coordinator, id: SessionId, text: &str) -> Move {
    coordinator
        .state(id)
        .unwrap()
        .position
        .move_from_uci(text)
        .unwrap()
}

#[test]
fn third_player_is_turned_away() {
    let coordinator = Coordinator::default();
    let (id, white, _) = started(&coordinator);
    assert_eq!(
        Err(SessionError::SessionFull),
        coordinator.join_session(id, &"spectator".into())
    );
    assert_eq!(Ok(Color::White), coordinator.join_session(id, &white));
}

#[test]
fn full_game_to_checkmate() {
    let coordinator = Coordinator::default();
    let (id, white, black) = started(&coordinator);
    let script = [
        (&white, "e2e4"),
        (&black, "e7e5"),
        (&white, "f1c4"),
        (&black, "b8c6"),
        (&white, "d1h5"),
        (&black, "g8f6"),
        (&white, "h5f7"),
    ];

    let mut last = GameStatus::InProgress;
    for &(player, text) in &script {
        let mov = uci(&coordinator, id, text);
        let (_, status) = coordinator.submit_move(id, player, mov).unwrap();
        last = status;
    }

    assert_eq!(GameStatus::Checkmate, last);
    let state = coordinator.state(id).unwrap();
    assert_eq!(SessionStatus::WhiteWon, state.status);
    assert_eq!(
        "1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0",
        state.movetext
    );

    let view = coordinator.view(id, &black).unwrap();
    assert!(view.your_turn);
    assert!(view.legal_moves.is_empty());
}

#[test]
fn rejected_moves_change_nothing() {
    let coordinator = Coordinator::default();
    let (id, white, black) = started(&coordinator);
    let before = coordinator.state(id).unwrap();

    let err = coordinator
        .submit_move(id, &white, Move::new(Square::E1, Square::E2, PieceKind::King))
        .unwrap_err();
    assert_eq!(Some(IllegalMoveReason::BlockedPath), err.illegal_move_reason());
    assert_eq!(
        Err(SessionError::NotYourTurn),
        coordinator
            .submit_move(id, &black, Move::new(Square::E7, Square::E5, PieceKind::Pawn))
            .map(|_| ())
    );
    assert_eq!(
        Err(SessionError::UnknownPlayer),
        coordinator
            .submit_move(id, &"mallory".into(), Move::new(Square::E2, Square::E4, PieceKind::Pawn))
            .map(|_| ())
    );
    assert_eq!(before, coordinator.state(id).unwrap());
}

#[test]
fn promotion_needs_a_choice() {
    let coordinator = Coordinator::default();
    let pos = Position::from_fen("8/P3k3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let id = coordinator.create_session_from(pos).unwrap();
    let white = PlayerId::from("w");
    coordinator.join_session(id, &white).unwrap();
    coordinator.join_session(id, &"b".into()).unwrap();

    let err = coordinator
        .submit_move(id, &white, Move::new(Square::A7, Square::A8, PieceKind::Pawn))
        .unwrap_err();
    assert_eq!("missing_promotion_choice", err.code());

    let (pos, _) = coordinator
        .submit_move(
            id,
            &white,
            Move::promotion(Square::A7, Square::A8, PieceKind::Knight),
        )
        .unwrap();
    assert_eq!(
        Some(PieceKind::Knight),
        pos.piece_at(Square::A8).map(|piece| piece.kind)
    );
}

#[test]
fn concurrent_submissions_for_one_turn() {
    for _ in 0..16 {
        let coordinator = Arc::new(Coordinator::default());
        let (id, white, _) = started(&coordinator);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [
            Move::new(Square::E2, Square::E4, PieceKind::Pawn),
            Move::new(Square::D2, Square::D4, PieceKind::Pawn),
        ]
        .iter()
        .map(|&mov| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            let white = white.clone();
            thread::spawn(move || {
                barrier.wait();
                coordinator.submit_move(id, &white, mov)
            })
        })
        .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        let successes = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(1, successes);
        let failure = results.into_iter().find_map(|result| result.err()).unwrap();
        assert_eq!(SessionError::NotYourTurn, failure);

        let state = coordinator.state(id).unwrap();
        assert_eq!(1, state.position.history().len());
        assert_eq!(Color::Black, state.position.side_to_move());
    }
}

#[test]
fn independent_sessions_in_parallel() {
    let coordinator = Arc::new(Coordinator::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                let (id, white, black) = started(&coordinator);
                for &(player, text) in &[(&white, "g1f3"), (&black, "g8f6")] {
                    let mov = uci(&coordinator, id, text);
                    coordinator.submit_move(id, player, mov).unwrap();
                }
                id
            })
        })
        .collect();

    for handle in handles {
        let id = handle.join().unwrap();
        let state = coordinator.state(id).unwrap();
        assert_eq!(2, state.position.history().len());
    }
    assert_eq!(8, coordinator.len());
}
