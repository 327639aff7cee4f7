// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A single two-player game. A `GameSession` owns the authoritative
//! `Position` of its game and the mapping from player identities to colors;
//! it enforces seating, turn order and the session lifecycle, and delegates
//! every chess question to `rules`.
//!
//! Sessions are not synchronized on their own. The coordinator wraps each of
//! them in a mutex so that moves on one session are applied one at a time.
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::moves::Move;
use crate::notation;
use crate::position::Position;
use crate::rules::{self, GameStatus};
use crate::types::Color;

/// Opaque identifier of a session, rendered as sixteen hex digits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> SessionId {
        SessionId(raw)
    }

    pub fn random() -> SessionId {
        SessionId(rand::random())
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<SessionId, ParseIntError> {
        u64::from_str_radix(s, 16).map(SessionId)
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<SessionId, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// The identity a player presents. Identities are opaque to the core; authenticating them is the
/// caller's business.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new<S: Into<String>>(id: S) -> PlayerId {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> PlayerId {
        PlayerId::new(id)
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> PlayerId {
        PlayerId(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    WhiteWon,
    BlackWon,
    Draw,
    Abandoned,
}

impl SessionStatus {
    /// The session status implied by the engine status of a position with `to_move` on move.
    /// A mated side to move means the other side, which just moved, has won.
    pub fn from_game(status: GameStatus, to_move: Color) -> SessionStatus {
        match status {
            GameStatus::Checkmate => match to_move {
                Color::White => SessionStatus::BlackWon,
                Color::Black => SessionStatus::WhiteWon,
            },
            status if status.is_draw() => SessionStatus::Draw,
            _ => SessionStatus::InProgress,
        }
    }

    /// Terminal sessions accept no further moves.
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::InProgress
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::WhiteWon => "white_won",
            SessionStatus::BlackWon => "black_won",
            SessionStatus::Draw => "draw",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
struct Seat {
    player: PlayerId,
    connected: bool,
}

/// Everything a session knows, as handed to the caller for distribution to both players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: SessionId,
    pub status: SessionStatus,
    pub game_status: GameStatus,
    pub white: Option<PlayerId>,
    pub black: Option<PlayerId>,
    pub position: Position,
    pub fen: String,
    pub last_move: Option<Move>,
    pub movetext: String,
}

/// One player's projection of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub color: Color,
    pub your_turn: bool,
    pub status: SessionStatus,
    pub game_status: GameStatus,
    pub opponent: Option<PlayerId>,
    pub opponent_connected: bool,
    pub position: Position,
    pub last_move: Option<Move>,
    /// Moves this player may submit right now. Empty unless it is their turn in a running game.
    pub legal_moves: Vec<Move>,
}

#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    position: Position,
    status: SessionStatus,
    game_status: GameStatus,
    white: Option<Seat>,
    black: Option<Seat>,
    last_activity: Instant,
}

impl GameSession {
    /// A new session playing from `position`, which must already be valid. A position that is
    /// already decided yields a session that is terminal from the start.
    pub fn new(id: SessionId, position: Position) -> GameSession {
        let game_status = rules::game_status(&position);
        GameSession {
            id,
            status: SessionStatus::from_game(game_status, position.side_to_move()),
            game_status,
            position,
            white: None,
            black: None,
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn game_status(&self) -> GameStatus {
        self.game_status
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub fn player(&self, color: Color) -> Option<&PlayerId> {
        self.seat(color).map(|seat| &seat.player)
    }

    pub fn is_connected(&self, color: Color) -> bool {
        self.seat(color).map_or(false, |seat| seat.connected)
    }

    pub fn color_of(&self, player: &PlayerId) -> Option<Color> {
        if self.player(Color::White) == Some(player) {
            Some(Color::White)
        } else if self.player(Color::Black) == Some(player) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.white.is_some() && self.black.is_some()
    }

    /// Seats `player`, White first and Black second. A player already seated keeps their color
    /// and is marked connected again.
    pub fn join(&mut self, player: &PlayerId) -> Result<Color, SessionError> {
        if let Some(color) = self.color_of(player) {
            self.seat_mut(color)
                .expect("seated player has a seat")
                .connected = true;
            self.touch();
            return Ok(color);
        }

        if self.status.is_terminal() {
            return Err(SessionError::GameOver {
                status: self.status,
            });
        }

        let color = if self.white.is_none() {
            Color::White
        } else if self.black.is_none() {
            Color::Black
        } else {
            return Err(SessionError::SessionFull);
        };

        *self.seat_slot(color) = Some(Seat {
            player: player.clone(),
            connected: true,
        });
        self.touch();
        Ok(color)
    }

    /// Plays `mov` for `player`. The session is left untouched if the move is rejected.
    pub fn submit(&mut self, player: &PlayerId, mov: Move) -> Result<(), SessionError> {
        let color = self.color_of(player).ok_or(SessionError::UnknownPlayer)?;
        if self.status.is_terminal() {
            return Err(SessionError::GameOver {
                status: self.status,
            });
        }

        if !self.is_full() {
            return Err(SessionError::AwaitingOpponent);
        }

        if self.position.side_to_move() != color {
            return Err(SessionError::NotYourTurn);
        }

        let next = rules::apply_move(&self.position, mov)?;
        self.game_status = rules::game_status(&next);
        self.status = SessionStatus::from_game(self.game_status, next.side_to_move());
        self.position = next;
        self.touch();
        Ok(())
    }

    /// Marks `player` disconnected. Once every seated player has left, a running game is
    /// abandoned. Returns whether this call abandoned the session.
    pub fn leave(&mut self, player: &PlayerId) -> Result<bool, SessionError> {
        let color = self.color_of(player).ok_or(SessionError::UnknownPlayer)?;
        self.seat_mut(color)
            .expect("seated player has a seat")
            .connected = false;
        self.touch();

        let anyone_left = self.is_connected(Color::White) || self.is_connected(Color::Black);
        if anyone_left {
            return Ok(false);
        }

        Ok(self.abandon())
    }

    /// Abandons a running game. Sessions that are already terminal keep their result. Returns
    /// whether the status changed.
    pub fn abandon(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.status = SessionStatus::Abandoned;
        self.touch();
        true
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            id: self.id,
            status: self.status,
            game_status: self.game_status,
            white: self.player(Color::White).cloned(),
            black: self.player(Color::Black).cloned(),
            position: self.position.clone(),
            fen: self.position.as_fen(),
            last_move: self.position.last_move(),
            movetext: notation::movetext(&self.position),
        }
    }

    pub fn view(&self, player: &PlayerId) -> Result<SessionView, SessionError> {
        let color = self.color_of(player).ok_or(SessionError::UnknownPlayer)?;
        let your_turn = self.position.side_to_move() == color;
        let legal_moves = if your_turn && self.is_full() && !self.status.is_terminal() {
            rules::legal_moves(&self.position)
        } else {
            vec![]
        };

        Ok(SessionView {
            id: self.id,
            color,
            your_turn,
            status: self.status,
            game_status: self.game_status,
            opponent: self.player(color.toggle()).cloned(),
            opponent_connected: self.is_connected(color.toggle()),
            position: self.position.clone(),
            last_move: self.position.last_move(),
            legal_moves,
        })
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn seat(&self, color: Color) -> Option<&Seat> {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    fn seat_mut(&mut self, color: Color) -> Option<&mut Seat> {
        self.seat_slot(color).as_mut()
    }

    fn seat_slot(&mut self, color: Color) -> &mut Option<Seat> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}
