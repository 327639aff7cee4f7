// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A rule-correct chess core for two-player games: a rules engine that
//! validates and applies moves and reports the state of the game, and a
//! coordinator that runs any number of independent two-player sessions on
//! top of it.

#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod api;
pub mod attacks;
mod bitboard;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod error;
mod move_generator;
mod moves;
pub mod notation;
mod perft;
mod position;
pub mod rules;
pub mod session;
mod types;
mod zobrist;

pub use bitboard::{Bitboard, BitboardIterator};
pub use config::Config;
pub use coordinator::Coordinator;
pub use error::{ConfigError, IllegalMoveReason, PositionError, RulesError, SessionError};
pub use move_generator::{MoveGenerator, MoveVec};
pub use moves::{HistoryEntry, Move};
pub use perft::perft;
pub use position::{FenParseError, Position, PositionSnapshot};
pub use rules::GameStatus;
pub use session::{PlayerId, SessionId, SessionState, SessionStatus, SessionView};
pub use types::{CastlingRights, Color, File, Piece, PieceKind, Rank, Square};
