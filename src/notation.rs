// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Standard algebraic notation for moves and PGN-style movetext for whole
//! games.
use std::fmt::Write;

use crate::moves::Move;
use crate::position::Position;
use crate::rules::{self, GameStatus};
use crate::types::{Color, PieceKind};

/// The SAN of `mov` played from `pos`, e.g. `Nbd7`, `exd6`, `e8=Q+` or `O-O-O#`. Returns `None`
/// if `mov` is not a legal move in `pos`.
pub fn san(pos: &Position, mov: Move) -> Option<String> {
    let legal = rules::legal_moves(pos);
    if !legal.contains(&mov) {
        return None;
    }

    let mut buf = String::new();
    if mov.is_castle {
        buf.push_str(if mov.is_kingside_castle() {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        let is_capture = mov.is_en_passant || pos.piece_at(mov.to).is_some();
        if mov.piece == PieceKind::Pawn {
            if is_capture {
                write!(&mut buf, "{}x", mov.from.file()).unwrap();
            }
        } else {
            buf.push(mov.piece.as_char().to_ascii_uppercase());
            let rivals: Vec<_> = legal
                .iter()
                .filter(|other| {
                    other.piece == mov.piece && other.to == mov.to && other.from != mov.from
                })
                .map(|other| other.from)
                .collect();
            if !rivals.is_empty() {
                let shares_file = rivals.iter().any(|sq| sq.file() == mov.from.file());
                let shares_rank = rivals.iter().any(|sq| sq.rank() == mov.from.rank());
                if !shares_file {
                    write!(&mut buf, "{}", mov.from.file()).unwrap();
                } else if !shares_rank {
                    write!(&mut buf, "{}", mov.from.rank()).unwrap();
                } else {
                    write!(&mut buf, "{}", mov.from).unwrap();
                }
            }

            if is_capture {
                buf.push('x');
            }
        }

        write!(&mut buf, "{}", mov.to).unwrap();
        if let Some(kind) = mov.promotion {
            write!(&mut buf, "={}", kind.as_char().to_ascii_uppercase()).unwrap();
        }
    }

    let next = rules::apply_move(pos, mov).ok()?;
    match rules::game_status(&next) {
        GameStatus::Checkmate => buf.push('#'),
        _ if next.is_check(next.side_to_move()) => buf.push('+'),
        _ => {}
    }

    Some(buf)
}

/// The game result token for a position: `1-0`, `0-1`, `1/2-1/2`, or `*` while the game goes on.
pub fn result_token(pos: &Position) -> &'static str {
    let status = rules::game_status(pos);
    if status == GameStatus::Checkmate {
        match pos.side_to_move() {
            Color::White => "0-1",
            Color::Black => "1-0",
        }
    } else if status.is_draw() {
        "1/2-1/2"
    } else {
        "*"
    }
}

/// PGN movetext for the history of `pos`, numbered from the position the history starts at and
/// terminated by the result token.
pub fn movetext(pos: &Position) -> String {
    let mut root = pos.clone();
    while root.unmake_move().is_some() {}

    let mut buf = String::new();
    for (ply, entry) in pos.history().iter().enumerate() {
        let text = san(&root, entry.mov).unwrap_or_else(|| entry.mov.as_uci());
        match root.side_to_move() {
            Color::White => write!(&mut buf, "{}. {} ", root.fullmove_number(), text).unwrap(),
            Color::Black if ply == 0 => {
                write!(&mut buf, "{}... {} ", root.fullmove_number(), text).unwrap()
            }
            Color::Black => write!(&mut buf, "{} ", text).unwrap(),
        }

        root.make_move(entry.mov);
    }

    buf.push_str(result_token(pos));
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    fn pos(fen: &'static str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn play(moves: &[&str]) -> Position {
        let mut current = Position::from_start_position();
        for text in moves {
            let mov = current.move_from_uci(text).unwrap();
            current = rules::apply_move(&current, mov).unwrap();
        }
        current
    }

    #[test]
    fn pawn_and_piece_moves() {
        let start = Position::from_start_position();
        assert_eq!(
            Some("e4".to_string()),
            san(&start, Move::new(Square::E2, Square::E4, PieceKind::Pawn))
        );
        assert_eq!(
            Some("Nf3".to_string()),
            san(&start, Move::new(Square::G1, Square::F3, PieceKind::Knight))
        );
        assert_eq!(
            None,
            san(&start, Move::new(Square::G1, Square::G3, PieceKind::Knight))
        );
    }

    #[test]
    fn captures() {
        let current = play(&["e2e4", "d7d5"]);
        assert_eq!(
            Some("exd5".to_string()),
            san(&current, Move::new(Square::E4, Square::D5, PieceKind::Pawn))
        );

        let ep = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert_eq!(
            Some("exd6".to_string()),
            san(&ep, Move::en_passant(Square::E5, Square::D6))
        );
    }

    #[test]
    fn disambiguation() {
        let knights = pos("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        assert_eq!(
            Some("Nbd2".to_string()),
            san(&knights, Move::new(Square::B1, Square::D2, PieceKind::Knight))
        );

        let rooks = pos("4k3/R7/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(
            Some("R1a4".to_string()),
            san(&rooks, Move::new(Square::A1, Square::A4, PieceKind::Rook))
        );

        let queens = pos("8/7k/8/8/Q2Q4/8/8/Q3K3 w - - 0 1");
        assert_eq!(
            Some("Qa4d1".to_string()),
            san(&queens, Move::new(Square::A4, Square::D1, PieceKind::Queen))
        );
    }

    #[test]
    fn castles_and_promotions() {
        let castle = pos("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(
            Some("O-O".to_string()),
            san(&castle, Move::castle(Square::E1, Square::G1))
        );
        assert_eq!(
            Some("O-O-O".to_string()),
            san(&castle, Move::castle(Square::E1, Square::C1))
        );

        let promote = pos("8/P3k3/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            Some("a8=Q".to_string()),
            san(&promote, Move::promotion(Square::A7, Square::A8, PieceKind::Queen))
        );
    }

    #[test]
    fn check_and_mate_suffixes() {
        let check = pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(
            Some("Ra8+".to_string()),
            san(&check, Move::new(Square::A1, Square::A8, PieceKind::Rook))
        );

        let current = play(&["f2f3", "e7e5", "g2g4"]);
        assert_eq!(
            Some("Qh4#".to_string()),
            san(&current, Move::new(Square::D8, Square::H4, PieceKind::Queen))
        );
    }

    #[test]
    fn fools_mate_movetext() {
        let current = play(&["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!("1. f3 e5 2. g4 Qh4# 0-1", movetext(&current));
    }

    #[test]
    fn movetext_from_black_to_move() {
        let start = pos("4k3/8/8/8/8/8/8/R3K3 b - - 0 12");
        let next =
            rules::apply_move(&start, Move::new(Square::E8, Square::D7, PieceKind::King)).unwrap();
        assert_eq!("12... Kd7 *", movetext(&next));
    }

    #[test]
    fn unfinished_game() {
        assert_eq!("*", movetext(&Position::from_start_position()));
    }
}
