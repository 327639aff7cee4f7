// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::convert::TryFrom;
use std::fmt::{self, Write};

use thiserror::Error;

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::error::PositionError;
use crate::moves::{HistoryEntry, Move};
use crate::rules;
use crate::types::TableIndex;
use crate::types::{CastleStatus, CastlingRights, Color, File, Piece, PieceKind, Rank, Square};
use crate::types::{COLORS, FILES, PIECE_KINDS, RANKS};
use crate::zobrist;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Possible errors that can arise when parsing a FEN string into a `Position`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum FenParseError {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid digit in piece placement")]
    InvalidDigit,
    #[error("rank does not sum to eight squares")]
    FileDoesNotSumToEight,
    #[error("unknown piece")]
    UnknownPiece,
    #[error("invalid side to move")]
    InvalidSideToMove,
    #[error("invalid castling rights")]
    InvalidCastle,
    #[error("invalid en-passant square")]
    InvalidEnPassant,
    #[error("missing halfmove clock")]
    EmptyHalfmove,
    #[error("invalid halfmove clock")]
    InvalidHalfmove,
    #[error("missing fullmove number")]
    EmptyFullmove,
    #[error("invalid fullmove number")]
    InvalidFullmove,
}

/// One authoritative chess position: piece placement, the auxiliary state that
/// decides which moves are legal, and the history of moves that led here.
///
/// A `Position` serializes as a `PositionSnapshot` and is validated when it is
/// deserialized, so a board read off the wire is as trustworthy as one built
/// by playing moves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PositionSnapshot", try_from = "PositionSnapshot")]
pub struct Position {
    boards_by_piece: [Bitboard; 12],
    boards_by_color: [Bitboard; 2],
    en_passant_square: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    side_to_move: Color,
    castle_status: CastleStatus,
    history: Vec<HistoryEntry>,
}

//
// Board state getters
//

impl Position {
    /// An empty board with White to move and no castling rights.
    pub fn new() -> Position {
        Position {
            boards_by_piece: [Bitboard::none(); 12],
            boards_by_color: [Bitboard::none(); 2],
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            side_to_move: Color::White,
            castle_status: CastleStatus::NONE,
            history: Vec::new(),
        }
    }

    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castle_status(&self) -> CastleStatus {
        self.castle_status
    }

    pub fn castling_rights(&self) -> CastlingRights {
        CastlingRights::from(self.castle_status)
    }

    pub fn can_castle_kingside(&self, color: Color) -> bool {
        self.castle_status.contains(CastleStatus::kingside(color))
    }

    pub fn can_castle_queenside(&self, color: Color) -> bool {
        self.castle_status.contains(CastleStatus::queenside(color))
    }

    /// Every move applied to reach this position, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|entry| entry.mov)
    }

    pub fn pieces(&self, color: Color) -> Bitboard {
        self.boards_by_color[color.as_index()]
    }

    pub fn occupancy(&self) -> Bitboard {
        self.pieces(Color::White) | self.pieces(Color::Black)
    }

    pub fn pieces_of_kind(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.boards_by_piece[board_index(color, kind)]
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of_kind(color, PieceKind::King).first()
    }

    /// The board as an 8x8 grid. Row 0 is the eighth rank and column 0 is the a-file.
    pub fn squares(&self) -> [[Option<Piece>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        for (row, cells) in grid.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                if let Some(square) = Square::from_coords(row as u8, col as u8) {
                    *cell = self.piece_at(square);
                }
            }
        }

        grid
    }
}

//
// Move application and board manipulation
//

impl Position {
    pub(crate) fn add_piece(&mut self, square: Square, piece: Piece) -> Result<(), ()> {
        if self.piece_at(square).is_some() {
            return Err(());
        }

        self.boards_by_color[piece.color.as_index()].set(square);
        self.boards_by_piece[board_index(piece.color, piece.kind)].set(square);
        Ok(())
    }

    pub(crate) fn remove_piece(&mut self, square: Square) -> Result<Piece, ()> {
        let existing_piece = self.piece_at(square).ok_or(())?;
        self.boards_by_color[existing_piece.color.as_index()].unset(square);
        self.boards_by_piece[board_index(existing_piece.color, existing_piece.kind)].unset(square);
        Ok(existing_piece)
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let color = if self.pieces(Color::White).test(square) {
            Color::White
        } else if self.pieces(Color::Black).test(square) {
            Color::Black
        } else {
            return None;
        };

        for &kind in &PIECE_KINDS {
            if self.pieces_of_kind(color, kind).test(square) {
                return Some(Piece::new(kind, color));
            }
        }

        // If we get here, we failed to update a bitboard somewhere.
        unreachable!()
    }

    /// Plays a pseudo-legal move and records it in the history. The caller is responsible for
    /// having checked the move against the move generator.
    pub(crate) fn make_move(&mut self, mov: Move) {
        let side = self.side_to_move;
        let mut entry = HistoryEntry {
            mov,
            captured: None,
            prior_castling: self.castling_rights(),
            prior_en_passant: self.en_passant_square,
            prior_halfmove_clock: self.halfmove_clock,
        };

        // En-passant moves are the only case when the piece being captured does not lie on the
        // destination square.
        let target_square =
            capture_square(mov, side).expect("invalid move: en-passant capture off the board");
        if self.piece_at(target_square).is_some() {
            let captured = self
                .remove_piece(target_square)
                .expect("invalid move: no piece at capture target");
            debug_assert!(captured.color != side, "invalid move: captures own piece");
            entry.captured = Some(captured.kind);
        }

        // Castles are encoded using the king's start and stop squares, so the rook is moved
        // here and the king below along with every other move.
        if mov.is_castle {
            let (rook_from, rook_to) = castle_rook_squares(mov);
            let rook = self
                .remove_piece(rook_from)
                .expect("invalid move: castle without rook");
            self.add_piece(rook_to, rook)
                .expect("invalid move: piece at rook target square");
        }

        let moving_piece = self
            .remove_piece(mov.from)
            .expect("invalid move: no piece at source square");
        let piece_to_add = match mov.promotion {
            Some(kind) => Piece::new(kind, side),
            None => moving_piece,
        };
        self.add_piece(mov.to, piece_to_add)
            .expect("invalid move: piece at destination square");

        self.en_passant_square = if mov.is_double_pawn_push() {
            Some(mov.from.towards(side.pawn_direction()))
        } else {
            None
        };

        // Moving a king or rook off its home square, or capturing a rook on its home square,
        // clears the matching rights for good.
        self.castle_status
            .remove(castle_rights_touched(mov.from) | castle_rights_touched(mov.to));

        if entry.captured.is_some() || moving_piece.kind == PieceKind::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if side == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = side.toggle();
        self.history.push(entry);
    }

    /// Takes back the most recent move, returning its history entry, or `None` if there is no
    /// history.
    pub(crate) fn unmake_move(&mut self) -> Option<HistoryEntry> {
        self.try_unmake_move()
            .expect("history entry does not match the board")
    }

    /// Takes back the most recent move, checking along the way that the board agrees with the
    /// history entry being undone. On failure the position is left partially unwound and must
    /// be discarded.
    fn try_unmake_move(&mut self) -> Result<Option<HistoryEntry>, ()> {
        let entry = match self.history.last() {
            Some(entry) => *entry,
            None => return Ok(None),
        };

        let mov = entry.mov;
        let mover = self.side_to_move.toggle();
        if mover == Color::Black && self.fullmove_number <= 1 {
            return Err(());
        }

        let landed = self.remove_piece(mov.to)?;
        if landed != Piece::new(mov.promotion.unwrap_or(mov.piece), mover) {
            return Err(());
        }

        self.add_piece(mov.from, Piece::new(mov.piece, mover))?;
        if mov.is_castle {
            let (rook_from, rook_to) = castle_rook_squares(mov);
            let rook = self.remove_piece(rook_to)?;
            if rook != Piece::new(PieceKind::Rook, mover) {
                return Err(());
            }

            self.add_piece(rook_from, rook)?;
        }

        if let Some(kind) = entry.captured {
            let square = capture_square(mov, mover).ok_or(())?;
            self.add_piece(square, Piece::new(kind, mover.toggle()))?;
        }

        self.castle_status = CastleStatus::from(entry.prior_castling);
        self.en_passant_square = entry.prior_en_passant;
        self.halfmove_clock = entry.prior_halfmove_clock;
        if mover == Color::Black {
            self.fullmove_number -= 1;
        }

        self.side_to_move = mover;
        self.history.pop();
        Ok(Some(entry))
    }
}

//
// Board analysis (check detection, repetition)
//

impl Position {
    /// The squares holding pieces of color `attacker` that attack `target`.
    pub fn squares_attacking(&self, attacker: Color, target: Square) -> Bitboard {
        let occupancy = self.occupancy();
        let diagonal = self.pieces_of_kind(attacker, PieceKind::Bishop)
            | self.pieces_of_kind(attacker, PieceKind::Queen);
        let straight = self.pieces_of_kind(attacker, PieceKind::Rook)
            | self.pieces_of_kind(attacker, PieceKind::Queen);

        // Attacks are symmetric, so look outwards from the target as if it held each kind of
        // piece. Pawns are the exception: the attacking pawn sits where a defending pawn on the
        // target would capture.
        (attacks::pawn_attacks(target, attacker.toggle())
            & self.pieces_of_kind(attacker, PieceKind::Pawn))
            | (attacks::knight_attacks(target) & self.pieces_of_kind(attacker, PieceKind::Knight))
            | (attacks::king_attacks(target) & self.pieces_of_kind(attacker, PieceKind::King))
            | (attacks::bishop_attacks(target, occupancy) & diagonal)
            | (attacks::rook_attacks(target, occupancy) & straight)
    }

    pub fn is_attacked(&self, attacker: Color, target: Square) -> bool {
        !self.squares_attacking(attacker, target).empty()
    }

    pub fn is_check(&self, color: Color) -> bool {
        self.pieces_of_kind(color, PieceKind::King)
            .iter()
            .any(|king| self.is_attacked(color.toggle(), king))
    }

    /// How many times the current position has occurred, counting this one. Only the tail of
    /// the history since the last capture or pawn move can repeat.
    pub fn repetition_count(&self) -> usize {
        let key = zobrist::hash(self);
        let reversible = self
            .history
            .iter()
            .rev()
            .take_while(|entry| !entry.is_irreversible())
            .count();

        let mut cursor = self.clone();
        let mut count = 1;
        for _ in 0..reversible {
            cursor.unmake_move();
            if cursor.side_to_move == self.side_to_move && zobrist::hash(&cursor) == key {
                count += 1;
            }
        }

        count
    }
}

//
// Validation
//

impl Position {
    /// Checks that this position could arise in a game: one king per side, no pawns on the
    /// back ranks, the side that just moved is not in check, castling rights and the
    /// en-passant target agree with the board, and the move history replays legally from the
    /// position it started from.
    pub fn validate(&self) -> Result<(), PositionError> {
        self.validate_board()?;
        if self.history.is_empty() {
            return Ok(());
        }

        let plies = self.history.len();
        let mut root = self.clone();
        for ply in (0..plies).rev() {
            let sound = entry_shape_is_sound(&root.history[ply], root.side_to_move.toggle());
            if !sound || root.try_unmake_move().is_err() {
                return Err(PositionError::InconsistentHistory { ply });
            }
        }

        root.validate_board()
            .map_err(|_| PositionError::InconsistentHistory { ply: 0 })?;
        for (ply, entry) in self.history.iter().enumerate() {
            if !rules::legal_moves(&root).contains(&entry.mov) {
                return Err(PositionError::InconsistentHistory { ply });
            }

            root.make_move(entry.mov);
            if root.history.last() != Some(entry) {
                return Err(PositionError::InconsistentHistory { ply });
            }
        }

        if root != *self {
            return Err(PositionError::InconsistentHistory { ply: plies });
        }

        Ok(())
    }

    fn validate_board(&self) -> Result<(), PositionError> {
        for &color in &COLORS {
            match self.pieces_of_kind(color, PieceKind::King).count() {
                0 => return Err(PositionError::MissingKing(color)),
                1 => {}
                _ => return Err(PositionError::ExtraKing(color)),
            }
        }

        let pawns = self.pieces_of_kind(Color::White, PieceKind::Pawn)
            | self.pieces_of_kind(Color::Black, PieceKind::Pawn);
        let back_ranks = Bitboard::all().rank(Rank::One) | Bitboard::all().rank(Rank::Eight);
        if let Some(square) = (pawns & back_ranks).first() {
            return Err(PositionError::PawnOnBackRank(square));
        }

        let waiting = self.side_to_move.toggle();
        if self.is_check(waiting) {
            return Err(PositionError::OpponentInCheck(waiting));
        }

        for &color in &COLORS {
            let back = Rank::back(color);
            let king = Piece::new(PieceKind::King, color);
            let rook = Piece::new(PieceKind::Rook, color);
            let checks = [
                (CastleStatus::kingside(color), File::H),
                (CastleStatus::queenside(color), File::A),
            ];
            for &(right, rook_file) in &checks {
                if !self.castle_status.contains(right) {
                    continue;
                }

                if self.piece_at(Square::of(back, File::E)) != Some(king)
                    || self.piece_at(Square::of(back, rook_file)) != Some(rook)
                {
                    return Err(PositionError::InvalidCastlingRights);
                }
            }
        }

        if let Some(ep_square) = self.en_passant_square {
            let mover = self.side_to_move.toggle();
            let expected_rank = match mover {
                Color::White => Rank::Three,
                Color::Black => Rank::Six,
            };
            let pushed_pawn = ep_square.try_towards(mover.pawn_direction());
            let start_square = ep_square.try_towards(self.side_to_move.pawn_direction());
            let consistent = ep_square.rank() == expected_rank
                && self.piece_at(ep_square).is_none()
                && start_square.map_or(false, |sq| self.piece_at(sq).is_none())
                && pushed_pawn.and_then(|sq| self.piece_at(sq))
                    == Some(Piece::new(PieceKind::Pawn, mover));
            if !consistent {
                return Err(PositionError::InvalidEnPassant(ep_square));
            }
        }

        if self.fullmove_number == 0 {
            return Err(PositionError::InvalidFullmoveNumber);
        }

        Ok(())
    }
}

//
// FEN and UCI parsing and generation.
//
// Positions can be created by parsing FEN and FEN can be produced from particular positions. A
// position parsed from FEN starts with an empty move history.
//

impl Position {
    pub fn from_start_position() -> Position {
        Position::from_fen(START_FEN).expect("start position FEN is valid")
    }

    /// Parses a FEN string and checks the result with `validate`. Use this for any FEN that comes
    /// from outside the program.
    pub fn from_fen_checked<S: AsRef<str>>(fen: S) -> Result<Position, PositionError> {
        let pos = Position::from_fen(fen)?;
        pos.validate()?;
        Ok(pos)
    }

    /// Constructs a new position from a FEN representation of a board position. The result is
    /// not validated. The functions in `rules` assume a board that passes `validate` and may
    /// panic on one that does not, so untrusted input should go through `from_fen_checked`.
    pub fn from_fen<S: AsRef<str>>(fen: S) -> Result<Position, FenParseError> {
        use std::iter::Peekable;
        use std::str::Chars;

        type Stream<'a> = Peekable<Chars<'a>>;

        fn eat<'a>(iter: &mut Stream<'a>, expected: char) -> Result<(), FenParseError> {
            match iter.next() {
                Some(c) if c == expected => Ok(()),
                Some(c) => Err(FenParseError::UnexpectedChar(c)),
                None => Err(FenParseError::UnexpectedEnd),
            }
        }

        fn advance<'a>(iter: &mut Stream<'a>) -> Result<(), FenParseError> {
            let _ = iter.next();
            Ok(())
        }

        fn peek<'a>(iter: &mut Stream<'a>) -> Result<char, FenParseError> {
            if let Some(c) = iter.peek() {
                Ok(*c)
            } else {
                Err(FenParseError::UnexpectedEnd)
            }
        }

        fn eat_side_to_move<'a>(iter: &mut Stream<'a>) -> Result<Color, FenParseError> {
            let side = match peek(iter)? {
                'w' => Color::White,
                'b' => Color::Black,
                _ => return Err(FenParseError::InvalidSideToMove),
            };

            advance(iter)?;
            Ok(side)
        }

        fn eat_castle_status<'a>(iter: &mut Stream<'a>) -> Result<CastleStatus, FenParseError> {
            if peek(iter)? == '-' {
                advance(iter)?;
                return Ok(CastleStatus::NONE);
            }

            let mut status = CastleStatus::NONE;
            for _ in 0..4 {
                match peek(iter)? {
                    'K' => status |= CastleStatus::WHITE_KINGSIDE,
                    'k' => status |= CastleStatus::BLACK_KINGSIDE,
                    'Q' => status |= CastleStatus::WHITE_QUEENSIDE,
                    'q' => status |= CastleStatus::BLACK_QUEENSIDE,
                    ' ' => break,
                    _ => return Err(FenParseError::InvalidCastle),
                }

                advance(iter)?;
            }

            Ok(status)
        }

        fn eat_en_passant<'a>(iter: &mut Stream<'a>) -> Result<Option<Square>, FenParseError> {
            let c = peek(iter)?;
            if c == '-' {
                advance(iter)?;
                return Ok(None);
            }

            let file = File::try_from(c).map_err(|_| FenParseError::InvalidEnPassant)?;
            advance(iter)?;
            let rank = Rank::try_from(peek(iter)?).map_err(|_| FenParseError::InvalidEnPassant)?;
            advance(iter)?;
            Ok(Some(Square::of(rank, file)))
        }

        fn eat_number<'a>(
            iter: &mut Stream<'a>,
            empty: FenParseError,
            invalid: FenParseError,
        ) -> Result<u32, FenParseError> {
            let mut buf = String::new();
            while let Some(&c) = iter.peek() {
                if !c.is_digit(10) {
                    break;
                }

                buf.push(c);
                advance(iter)?;
            }

            if buf.is_empty() {
                return Err(empty);
            }

            buf.parse::<u32>().map_err(|_| invalid)
        }

        let mut pos = Position::new();
        let iter = &mut fen.as_ref().chars().peekable();
        for &rank in RANKS.iter().rev() {
            let mut file = File::A as usize;
            while file <= File::H as usize {
                let c = peek(iter)?;
                // digits 1 through 8 indicate empty squares.
                if c.is_digit(10) {
                    if c < '1' || c > '8' {
                        return Err(FenParseError::InvalidDigit);
                    }

                    file += c as usize - '0' as usize;
                    if file > 8 {
                        return Err(FenParseError::FileDoesNotSumToEight);
                    }

                    advance(iter)?;
                    continue;
                }

                // if it's not a digit, it represents a piece.
                let piece = Piece::try_from(c).map_err(|_| FenParseError::UnknownPiece)?;
                let square = Square::of(rank, File::from_index(file));
                pos.add_piece(square, piece)
                    .expect("FEN placement visits each square once");
                advance(iter)?;
                file += 1;
            }

            if rank != Rank::One {
                eat(iter, '/')?;
            }
        }

        eat(iter, ' ')?;
        pos.side_to_move = eat_side_to_move(iter)?;
        eat(iter, ' ')?;
        pos.castle_status = eat_castle_status(iter)?;
        eat(iter, ' ')?;
        pos.en_passant_square = eat_en_passant(iter)?;
        eat(iter, ' ')?;
        pos.halfmove_clock = eat_number(
            iter,
            FenParseError::EmptyHalfmove,
            FenParseError::InvalidHalfmove,
        )?;
        eat(iter, ' ')?;
        pos.fullmove_number = eat_number(
            iter,
            FenParseError::EmptyFullmove,
            FenParseError::InvalidFullmove,
        )?;
        Ok(pos)
    }

    /// Parses the UCI representation of a move in the context of this position. The result is
    /// not checked for legality; `None` means the text does not describe a move of a piece on
    /// this board at all.
    pub fn move_from_uci(&self, move_str: &str) -> Option<Move> {
        let move_chrs: Vec<_> = move_str.chars().collect();
        if move_chrs.len() != 4 && move_chrs.len() != 5 {
            return None;
        }

        let source = Square::of(
            Rank::try_from(move_chrs[1]).ok()?,
            File::try_from(move_chrs[0]).ok()?,
        );
        let dest = Square::of(
            Rank::try_from(move_chrs[3]).ok()?,
            File::try_from(move_chrs[2]).ok()?,
        );
        let promotion = match move_chrs.get(4) {
            Some(&c) if c.is_ascii_lowercase() => {
                let kind = PieceKind::try_from(c).ok()?;
                if !kind.is_promotion_target() {
                    return None;
                }

                Some(kind)
            }
            Some(_) => return None,
            None => None,
        };

        let moving_piece = self.piece_at(source)?;
        if let Some(kind) = promotion {
            return Some(Move::promotion(source, dest, kind));
        }

        match moving_piece.kind {
            PieceKind::King
                if source.file() == File::E
                    && source.rank() == Rank::back(moving_piece.color)
                    && (dest == Square::of(source.rank(), File::G)
                        || dest == Square::of(source.rank(), File::C)) =>
            {
                Some(Move::castle(source, dest))
            }
            PieceKind::Pawn
                if source.file() != dest.file()
                    && Some(dest) == self.en_passant_square
                    && self.piece_at(dest).is_none() =>
            {
                Some(Move::en_passant(source, dest))
            }
            kind => Some(Move::new(source, dest, kind)),
        }
    }

    pub fn as_fen(&self) -> String {
        let mut buf = String::new();
        for &rank in RANKS.iter().rev() {
            let mut empty_squares = 0;
            for &file in &FILES {
                let square = Square::of(rank, file);
                if let Some(piece) = self.piece_at(square) {
                    if empty_squares != 0 {
                        write!(&mut buf, "{}", empty_squares).unwrap();
                    }
                    write!(&mut buf, "{}", piece).unwrap();
                    empty_squares = 0;
                } else {
                    empty_squares += 1;
                }
            }

            if empty_squares != 0 {
                write!(&mut buf, "{}", empty_squares).unwrap();
            }

            if rank != Rank::One {
                buf.push('/');
            }
        }

        buf.push(' ');
        match self.side_to_move() {
            Color::White => buf.push('w'),
            Color::Black => buf.push('b'),
        }
        buf.push(' ');
        if self.castle_status.is_empty() {
            buf.push('-');
        }
        if self.can_castle_kingside(Color::White) {
            buf.push('K');
        }
        if self.can_castle_queenside(Color::White) {
            buf.push('Q');
        }
        if self.can_castle_kingside(Color::Black) {
            buf.push('k');
        }
        if self.can_castle_queenside(Color::Black) {
            buf.push('q');
        }
        buf.push(' ');
        if let Some(ep_square) = self.en_passant_square() {
            write!(&mut buf, "{}", ep_square).unwrap();
        } else {
            buf.push('-');
        }
        buf.push(' ');
        write!(
            &mut buf,
            "{} {}",
            self.halfmove_clock(),
            self.fullmove_number()
        )
        .unwrap();
        buf
    }
}

//
// Serialization
//

/// The wire shape of a `Position`. Every field of the position is present, including the full
/// move history with the state each move destroyed, so that a snapshot converts back into an
/// identical position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub squares: [[Option<Piece>; 8]; 8],
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub move_history: Vec<HistoryEntry>,
}

impl From<Position> for PositionSnapshot {
    fn from(pos: Position) -> PositionSnapshot {
        PositionSnapshot {
            squares: pos.squares(),
            side_to_move: pos.side_to_move,
            castling_rights: pos.castling_rights(),
            en_passant_target: pos.en_passant_square,
            halfmove_clock: pos.halfmove_clock,
            fullmove_number: pos.fullmove_number,
            move_history: pos.history,
        }
    }
}

impl TryFrom<PositionSnapshot> for Position {
    type Error = PositionError;

    fn try_from(snapshot: PositionSnapshot) -> Result<Position, PositionError> {
        let mut pos = Position::new();
        for (row, cells) in snapshot.squares.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if let (Some(piece), Some(square)) = (cell, Square::from_coords(row as u8, col as u8))
                {
                    pos.add_piece(square, *piece)
                        .expect("grid cells map to distinct squares");
                }
            }
        }

        pos.side_to_move = snapshot.side_to_move;
        pos.castle_status = CastleStatus::from(snapshot.castling_rights);
        pos.en_passant_square = snapshot.en_passant_target;
        pos.halfmove_clock = snapshot.halfmove_clock;
        pos.fullmove_number = snapshot.fullmove_number;
        pos.history = snapshot.move_history;
        pos.validate()?;
        Ok(pos)
    }
}

//
// Trait implementations
//

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &rank in RANKS.iter().rev() {
            for &file in &FILES {
                let sq = Square::of(rank, file);
                if let Some(piece) = self.piece_at(sq) {
                    write!(f, " {} ", piece)?;
                } else {
                    write!(f, " . ")?;
                }
            }

            writeln!(f, "| {}", rank)?;
        }

        for _ in &FILES {
            write!(f, "---")?;
        }

        writeln!(f)?;
        for &file in &FILES {
            write!(f, " {} ", file)?;
        }

        writeln!(f)?;
        Ok(())
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::from_start_position()
    }
}

//
// Helper functions
//

fn board_index(color: Color, kind: PieceKind) -> usize {
    color.as_index() * 6 + kind.as_index()
}

/// The square holding the piece a move captures, if it captures anything. `None` only for an
/// en-passant move whose victim square would be off the board.
fn capture_square(mov: Move, mover: Color) -> Option<Square> {
    if mov.is_en_passant {
        mov.to.try_towards(mover.toggle().pawn_direction())
    } else {
        Some(mov.to)
    }
}

/// Cheap shape checks on a history entry before the board is unwound with it. Anything these
/// let through is still checked square by square and again on replay.
fn entry_shape_is_sound(entry: &HistoryEntry, mover: Color) -> bool {
    let mov = entry.mov;
    if mov.is_en_passant {
        let target_rank = match mover {
            Color::White => Rank::Six,
            Color::Black => Rank::Three,
        };
        return mov.piece == PieceKind::Pawn
            && mov.promotion.is_none()
            && !mov.is_castle
            && mov.to.rank() == target_rank
            && entry.captured == Some(PieceKind::Pawn);
    }

    if mov.is_castle {
        let back = Rank::back(mover);
        return mov.piece == PieceKind::King
            && mov.promotion.is_none()
            && entry.captured.is_none()
            && mov.from == Square::of(back, File::E)
            && (mov.to == Square::of(back, File::G) || mov.to == Square::of(back, File::C));
    }

    true
}

/// The rook's start and stop squares for a castle.
fn castle_rook_squares(mov: Move) -> (Square, Square) {
    let rank = mov.from.rank();
    if mov.is_kingside_castle() {
        (Square::of(rank, File::H), Square::of(rank, File::F))
    } else {
        (Square::of(rank, File::A), Square::of(rank, File::D))
    }
}

/// The castle rights lost when a piece leaves or arrives at `square`.
fn castle_rights_touched(square: Square) -> CastleStatus {
    match square {
        Square::E1 => CastleStatus::WHITE,
        Square::H1 => CastleStatus::WHITE_KINGSIDE,
        Square::A1 => CastleStatus::WHITE_QUEENSIDE,
        Square::E8 => CastleStatus::BLACK,
        Square::H8 => CastleStatus::BLACK_KINGSIDE,
        Square::A8 => CastleStatus::BLACK_QUEENSIDE,
        _ => CastleStatus::NONE,
    }
}
