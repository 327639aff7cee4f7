// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The request layer. `Api` routes transport-neutral requests (a method, a
//! path, the caller's player identity and an optional JSON body) to the
//! coordinator and turns the outcome into a status code and a JSON body.
//! Whatever carries the requests (an HTTP server, the stdio console) only
//! has to move these values around.
//!
//! Routes:
//!
//! * `GET /session/new`: creates a session, returns its state.
//! * `POST /session/{id}/join`: seats the player, returns their color and the state.
//! * `POST /session/{id}/move`: plays the move in the body, returns the state.
//! * `GET /session/{id}/state`: returns the state.
//! * `GET /session/{id}/view`: returns the player's view.
use std::convert::TryFrom;
use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Value};

use crate::coordinator::Coordinator;
use crate::error::SessionError;
use crate::moves::Move;
use crate::session::{PlayerId, SessionId};
use crate::types::{PieceKind, Square};

lazy_static! {
    static ref NEW_SESSION: Regex = Regex::new(r"^/session/new/?$").expect("valid route regex");
    static ref SESSION_ACTION: Regex =
        Regex::new(r"^/session/([0-9a-fA-F]{1,16})/(join|move|state|view)/?$")
            .expect("valid route regex");
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> ApiResponse {
        ApiResponse { status: 200, body }
    }

    fn error(status: u16, code: &str, message: String) -> ApiResponse {
        ApiResponse {
            status,
            body: json!({ "error": { "code": code, "message": message } }),
        }
    }

    fn rejection(err: &SessionError) -> ApiResponse {
        let mut response = ApiResponse::error(status_for(err), err.code(), err.to_string());
        if let Some(reason) = err.illegal_move_reason() {
            response.body["error"]["reason"] = json!(reason);
        }
        response
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// The error code of a rejection, if this response is one.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

/// The HTTP-like status a rejection maps to.
pub fn status_for(err: &SessionError) -> u16 {
    match err.code() {
        "illegal_move" | "missing_promotion_choice" => 422,
        "unknown_player" => 403,
        "session_not_found" => 404,
        "malformed_move_request" | "invalid_position" => 400,
        "capacity_exceeded" => 503,
        _ => 409,
    }
}

/// The JSON shape of a submitted move. Squares are `(row, col)` pairs with row 0 the eighth rank
/// and col 0 the a-file. Pieces are letters (`P`, `n`) or names (`queen`).
#[derive(Clone, Debug, Deserialize)]
pub struct MoveRequest {
    pub from_row: i64,
    pub from_col: i64,
    pub to_row: i64,
    pub to_col: i64,
    pub piece: String,
    #[serde(default)]
    pub promotion: Option<String>,
    #[serde(default)]
    pub is_castle: bool,
    #[serde(default)]
    pub is_en_passant: bool,
}

impl MoveRequest {
    pub fn parse(body: &str) -> Result<MoveRequest, SessionError> {
        serde_json::from_str(body).map_err(|err| SessionError::malformed(err.to_string()))
    }

    /// Checks the request's shape and builds the `Move` it describes. Whether the move is legal
    /// is for the rules engine to decide.
    pub fn into_move(self) -> Result<Move, SessionError> {
        let from = square_at(self.from_row, self.from_col)?;
        let to = square_at(self.to_row, self.to_col)?;
        let piece = parse_kind(&self.piece)?;
        let promotion = match self.promotion {
            Some(ref text) => {
                let kind = parse_kind(text)?;
                if !kind.is_promotion_target() {
                    return Err(SessionError::malformed(format!(
                        "cannot promote to {}",
                        text
                    )));
                }
                Some(kind)
            }
            None => None,
        };

        Ok(Move {
            from,
            to,
            piece,
            promotion,
            is_castle: self.is_castle,
            is_en_passant: self.is_en_passant,
        })
    }
}

fn square_at(row: i64, col: i64) -> Result<Square, SessionError> {
    let on_board = |n: i64| n >= 0 && n < 8;
    if on_board(row) && on_board(col) {
        if let Some(square) = Square::from_coords(row as u8, col as u8) {
            return Ok(square);
        }
    }

    Err(SessionError::malformed(format!(
        "square ({}, {}) is off the board",
        row, col
    )))
}

fn parse_kind(text: &str) -> Result<PieceKind, SessionError> {
    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return PieceKind::try_from(c)
            .map_err(|_| SessionError::malformed(format!("unknown piece {:?}", text)));
    }

    match text.to_ascii_lowercase().as_str() {
        "pawn" => Ok(PieceKind::Pawn),
        "knight" => Ok(PieceKind::Knight),
        "bishop" => Ok(PieceKind::Bishop),
        "rook" => Ok(PieceKind::Rook),
        "queen" => Ok(PieceKind::Queen),
        "king" => Ok(PieceKind::King),
        _ => Err(SessionError::malformed(format!("unknown piece {:?}", text))),
    }
}

pub struct Api {
    coordinator: Arc<Coordinator>,
}

impl Api {
    pub fn new(coordinator: Arc<Coordinator>) -> Api {
        Api { coordinator }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn handle(
        &self,
        method: &str,
        path: &str,
        player: Option<&str>,
        body: Option<&str>,
    ) -> ApiResponse {
        debug!("{} {} (player {:?})", method, path, player);
        let method = method.to_ascii_uppercase();

        let result = if NEW_SESSION.is_match(path) {
            match method.as_str() {
                "GET" => self.new_session(),
                _ => return method_not_allowed(&method, path),
            }
        } else if let Some(captures) = SESSION_ACTION.captures(path) {
            let id = match captures[1].parse::<SessionId>() {
                Ok(id) => id,
                Err(_) => return not_found(path),
            };

            match (method.as_str(), &captures[2]) {
                ("POST", "join") => self.join(id, player),
                ("POST", "move") => self.submit(id, player, body),
                ("GET", "state") => self.state(id),
                ("GET", "view") => self.view(id, player),
                _ => return method_not_allowed(&method, path),
            }
        } else {
            return not_found(path);
        };

        match result {
            Ok(body) => ApiResponse::ok(body),
            Err(err) => {
                debug!("{} {} rejected: {}", method, path, err.code());
                ApiResponse::rejection(&err)
            }
        }
    }

    fn new_session(&self) -> Result<Value, SessionError> {
        let id = self.coordinator.create_session()?;
        let state = self.coordinator.state(id)?;
        Ok(json!(state))
    }

    fn join(&self, id: SessionId, player: Option<&str>) -> Result<Value, SessionError> {
        let player = player_id(player)?;
        let (color, state) = self.coordinator.join_session_state(id, &player)?;
        Ok(json!({ "color": color, "state": state }))
    }

    fn submit(
        &self,
        id: SessionId,
        player: Option<&str>,
        body: Option<&str>,
    ) -> Result<Value, SessionError> {
        let player = player_id(player)?;
        let body = body.ok_or_else(|| SessionError::malformed("missing move body"))?;
        let mov = MoveRequest::parse(body)?.into_move()?;
        let state = self.coordinator.submit_move_state(id, &player, mov)?;
        Ok(json!(state))
    }

    fn state(&self, id: SessionId) -> Result<Value, SessionError> {
        let state = self.coordinator.state(id)?;
        Ok(json!(state))
    }

    fn view(&self, id: SessionId, player: Option<&str>) -> Result<Value, SessionError> {
        let player = player_id(player)?;
        let view = self.coordinator.view(id, &player)?;
        Ok(json!(view))
    }
}

/// Requests without a player identity cannot belong to any seated player.
fn player_id(player: Option<&str>) -> Result<PlayerId, SessionError> {
    match player {
        Some(player) if !player.is_empty() => Ok(PlayerId::from(player)),
        _ => Err(SessionError::UnknownPlayer),
    }
}

fn not_found(path: &str) -> ApiResponse {
    ApiResponse::error(404, "route_not_found", format!("no route for {}", path))
}

fn method_not_allowed(method: &str, path: &str) -> ApiResponse {
    ApiResponse::error(
        405,
        "method_not_allowed",
        format!("{} is not allowed on {}", method, path),
    )
}
