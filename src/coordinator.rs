// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The session registry. The coordinator maps session ids to sessions and
//! routes every call to the session it names.
//!
//! The registry lock is held only long enough to look a session up; all
//! work on a session happens under that session's own mutex, so sessions
//! never wait on each other and two submissions to the same session are
//! applied one after the other. The registry lock is never taken while a
//! session lock is held.
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::SessionError;
use crate::moves::Move;
use crate::position::Position;
use crate::rules::GameStatus;
use crate::session::{GameSession, PlayerId, SessionId, SessionState, SessionView};
use crate::types::Color;

type SessionRef = Arc<Mutex<GameSession>>;

pub struct Coordinator {
    config: Config,
    sessions: RwLock<HashMap<SessionId, SessionRef>>,
}

impl Coordinator {
    pub fn new(config: Config) -> Coordinator {
        Coordinator {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of sessions in the registry, finished ones included until they are pruned.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Creates an empty session playing from the standard starting position.
    pub fn create_session(&self) -> Result<SessionId, SessionError> {
        self.insert(Position::from_start_position())
    }

    /// Creates an empty session playing from `position`, which is validated first.
    pub fn create_session_from(&self, position: Position) -> Result<SessionId, SessionError> {
        position.validate()?;
        self.insert(position)
    }

    pub fn join_session(&self, id: SessionId, player: &PlayerId) -> Result<Color, SessionError> {
        let session = self.session(id)?;
        let mut session = session.lock();
        join(&mut session, player)
    }

    /// Like `join_session`, but also returns the session state as of the join, read under the
    /// same lock.
    pub fn join_session_state(
        &self,
        id: SessionId,
        player: &PlayerId,
    ) -> Result<(Color, SessionState), SessionError> {
        let session = self.session(id)?;
        let mut session = session.lock();
        let color = join(&mut session, player)?;
        Ok((color, session.state()))
    }

    /// Plays `mov` for `player` and returns the resulting position and engine status.
    pub fn submit_move(
        &self,
        id: SessionId,
        player: &PlayerId,
        mov: Move,
    ) -> Result<(Position, GameStatus), SessionError> {
        let session = self.session(id)?;
        let mut session = session.lock();
        submit(&mut session, player, mov)?;
        Ok((session.position().clone(), session.game_status()))
    }

    /// Plays `mov` for `player` and returns the session state that move produced. The state is
    /// built under the same lock as the move, so no other submission, sweep or prune can come
    /// between them.
    pub fn submit_move_state(
        &self,
        id: SessionId,
        player: &PlayerId,
        mov: Move,
    ) -> Result<SessionState, SessionError> {
        let session = self.session(id)?;
        let mut session = session.lock();
        submit(&mut session, player, mov)?;
        Ok(session.state())
    }

    pub fn leave_session(&self, id: SessionId, player: &PlayerId) -> Result<(), SessionError> {
        let session = self.session(id)?;
        let mut session = session.lock();
        let abandoned = session.leave(player)?;
        debug!("session {}: {} disconnected", id, player);
        if abandoned {
            info!("session {}: abandoned, both players left", id);
        }

        Ok(())
    }

    /// Abandons a running session. Finished sessions keep their result.
    pub fn mark_abandoned(&self, id: SessionId) -> Result<(), SessionError> {
        let session = self.session(id)?;
        if session.lock().abandon() {
            info!("session {}: abandoned", id);
        }

        Ok(())
    }

    pub fn state(&self, id: SessionId) -> Result<SessionState, SessionError> {
        let session = self.session(id)?;
        let state = session.lock().state();
        Ok(state)
    }

    pub fn view(&self, id: SessionId, player: &PlayerId) -> Result<SessionView, SessionError> {
        let session = self.session(id)?;
        let view = session.lock().view(player);
        view
    }

    /// Abandons every running session that has seen no activity for `max_idle`. Returns how many
    /// sessions were abandoned.
    pub fn abandon_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut count = 0;
        for session in self.snapshot() {
            let mut session = session.lock();
            if session.idle_for(now) >= max_idle && session.abandon() {
                info!("session {}: abandoned after {:?} idle", session.id(), max_idle);
                count += 1;
            }
        }

        count
    }

    /// Removes finished and abandoned sessions from the registry once they have sat idle for the
    /// configured retention period, so both players can still read the result in the meantime.
    /// Does nothing if the configuration disables pruning. Returns how many sessions were removed.
    pub fn prune(&self) -> usize {
        if !self.config.prune_finished {
            return 0;
        }

        let now = Instant::now();
        let retention = self.config.finished_retention();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let session = session.lock();
            let keep = !session.status().is_terminal() || session.idle_for(now) < retention;
            if !keep {
                debug!("session {}: pruned", id);
            }
            keep
        });
        before - sessions.len()
    }

    /// Applies the configured idle timeout and pruning in one pass.
    pub fn sweep(&self) {
        let abandoned = match self.config.idle_timeout() {
            Some(max_idle) => self.abandon_idle(max_idle),
            None => 0,
        };
        let pruned = self.prune();
        if abandoned > 0 || pruned > 0 {
            debug!("sweep: {} abandoned, {} pruned", abandoned, pruned);
        }
    }

    fn insert(&self, position: Position) -> Result<SessionId, SessionError> {
        let mut sessions = self.sessions.write();
        if let Some(limit) = self.config.session_limit() {
            if sessions.len() >= limit {
                debug!("refusing new session, {} sessions live", sessions.len());
                return Err(SessionError::CapacityExceeded { limit });
            }
        }

        let mut id = SessionId::random();
        while sessions.contains_key(&id) {
            id = SessionId::random();
        }

        sessions.insert(id, Arc::new(Mutex::new(GameSession::new(id, position))));
        info!("session {}: created", id);
        Ok(id)
    }

    fn session(&self, id: SessionId) -> Result<SessionRef, SessionError> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(SessionError::SessionNotFound(id))
    }

    fn snapshot(&self) -> Vec<SessionRef> {
        self.sessions.read().values().cloned().collect()
    }
}

fn join(session: &mut GameSession, player: &PlayerId) -> Result<Color, SessionError> {
    let color = session.join(player)?;
    info!("session {}: {} joined as {}", session.id(), player, color);
    Ok(color)
}

fn submit(session: &mut GameSession, player: &PlayerId, mov: Move) -> Result<(), SessionError> {
    let id = session.id();
    if let Err(err) = session.submit(player, mov) {
        debug!("session {}: rejected {} from {}: {}", id, mov, player, err);
        return Err(err);
    }

    info!(
        "session {}: {} played {} ({})",
        id,
        player,
        mov,
        session.game_status()
    );
    if session.status().is_terminal() {
        info!("session {}: finished, {}", id, session.status());
    }

    Ok(())
}

impl Default for Coordinator {
    fn default() -> Coordinator {
        Coordinator::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use crate::types::{PieceKind, Square};

    fn e2e4() -> Move {
        Move::new(Square::E2, Square::E4, PieceKind::Pawn)
    }

    fn started(coordinator: &Coordinator) -> (SessionId, PlayerId, PlayerId) {
        let id = coordinator.create_session().unwrap();
        let alice = PlayerId::from("alice");
        let bob = PlayerId::from("bob");
        coordinator.join_session(id, &alice).unwrap();
        coordinator.join_session(id, &bob).unwrap();
        (id, alice, bob)
    }

    #[test]
    fn unknown_session() {
        let coordinator = Coordinator::default();
        let id = SessionId::new(7);
        assert_eq!(
            Err(SessionError::SessionNotFound(id)),
            coordinator.join_session(id, &"alice".into())
        );
        assert_eq!(
            Err(SessionError::SessionNotFound(id)),
            coordinator.mark_abandoned(id)
        );
    }

    #[test]
    fn submit_returns_position_and_status() {
        let coordinator = Coordinator::default();
        let (id, alice, _) = started(&coordinator);
        let (pos, status) = coordinator.submit_move(id, &alice, e2e4()).unwrap();
        assert_eq!(GameStatus::InProgress, status);
        assert_eq!(Color::Black, pos.side_to_move());
        assert_eq!(Some(Square::E3), pos.en_passant_square());
        assert_eq!(pos, coordinator.state(id).unwrap().position);
    }

    #[test]
    fn submitted_state_survives_pruning() {
        let coordinator = Coordinator::new(Config {
            finished_retention_secs: 0,
            ..Config::default()
        });
        let (id, alice, bob) = started(&coordinator);
        let moves = [
            (&alice, Move::new(Square::F2, Square::F3, PieceKind::Pawn)),
            (&bob, Move::new(Square::E7, Square::E5, PieceKind::Pawn)),
            (&alice, Move::new(Square::G2, Square::G4, PieceKind::Pawn)),
        ];
        for &(player, mov) in &moves {
            coordinator.submit_move(id, player, mov).unwrap();
        }

        let mate = Move::new(Square::D8, Square::H4, PieceKind::Queen);
        let state = coordinator.submit_move_state(id, &bob, mate).unwrap();
        assert_eq!(SessionStatus::BlackWon, state.status);
        assert_eq!(Some(mate), state.last_move);
        assert_eq!(4, state.position.history().len());

        // the finished session is gone, but the mover already holds its final state
        assert_eq!(1, coordinator.prune());
        assert_eq!(
            Err(SessionError::SessionNotFound(id)),
            coordinator.state(id).map(|_| ())
        );
    }

    #[test]
    fn join_state_matches_the_seat() {
        let coordinator = Coordinator::default();
        let id = coordinator.create_session().unwrap();
        let (color, state) = coordinator
            .join_session_state(id, &"alice".into())
            .unwrap();
        assert_eq!(Color::White, color);
        assert_eq!(Some(PlayerId::from("alice")), state.white);
        assert_eq!(None, state.black);
    }

    #[test]
    fn sessions_are_independent() {
        let coordinator = Coordinator::default();
        let (first, alice, _) = started(&coordinator);
        let (second, _, _) = started(&coordinator);
        assert_ne!(first, second);
        coordinator.submit_move(first, &alice, e2e4()).unwrap();
        assert_eq!(
            Color::White,
            coordinator.state(second).unwrap().position.side_to_move()
        );
    }

    #[test]
    fn custom_positions_are_validated() {
        let coordinator = Coordinator::default();
        let pos = Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        match coordinator.create_session_from(pos) {
            Err(SessionError::InvalidPosition(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        let pos = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let id = coordinator.create_session_from(pos.clone()).unwrap();
        assert_eq!(pos, coordinator.state(id).unwrap().position);
    }

    #[test]
    fn capacity() {
        let coordinator = Coordinator::new(Config {
            max_sessions: 1,
            finished_retention_secs: 0,
            ..Config::default()
        });
        let id = coordinator.create_session().unwrap();
        assert_eq!(
            Err(SessionError::CapacityExceeded { limit: 1 }),
            coordinator.create_session()
        );

        coordinator.mark_abandoned(id).unwrap();
        assert_eq!(1, coordinator.prune());
        assert!(coordinator.is_empty());
        assert!(coordinator.create_session().is_ok());
    }

    #[test]
    fn leaving_abandons_once_both_are_gone() {
        let coordinator = Coordinator::default();
        let (id, alice, bob) = started(&coordinator);
        coordinator.leave_session(id, &alice).unwrap();
        assert_eq!(
            SessionStatus::InProgress,
            coordinator.state(id).unwrap().status
        );
        coordinator.leave_session(id, &bob).unwrap();
        assert_eq!(
            SessionStatus::Abandoned,
            coordinator.state(id).unwrap().status
        );
        assert_eq!(
            Err(SessionError::GameOver {
                status: SessionStatus::Abandoned
            }),
            coordinator.submit_move(id, &alice, e2e4()).map(|_| ())
        );
    }

    #[test]
    fn idle_sessions_are_abandoned() {
        let coordinator = Coordinator::default();
        let (id, _, _) = started(&coordinator);
        assert_eq!(0, coordinator.abandon_idle(Duration::from_secs(3600)));
        assert_eq!(1, coordinator.abandon_idle(Duration::from_secs(0)));
        assert_eq!(
            SessionStatus::Abandoned,
            coordinator.state(id).unwrap().status
        );
        assert_eq!(0, coordinator.abandon_idle(Duration::from_secs(0)));
    }

    #[test]
    fn prune_respects_config() {
        let coordinator = Coordinator::new(Config {
            prune_finished: false,
            ..Config::default()
        });
        let id = coordinator.create_session().unwrap();
        coordinator.mark_abandoned(id).unwrap();
        assert_eq!(0, coordinator.prune());
        assert_eq!(vec![id], coordinator.session_ids());
    }

    #[test]
    fn finished_sessions_stay_readable_until_retention_passes() {
        let coordinator = Coordinator::default();
        let (id, _, bob) = started(&coordinator);
        coordinator.mark_abandoned(id).unwrap();

        coordinator.sweep();
        assert_eq!(0, coordinator.prune());
        assert_eq!(
            SessionStatus::Abandoned,
            coordinator.state(id).unwrap().status
        );
        assert!(coordinator.view(id, &bob).is_ok());
    }

    #[test]
    fn view_is_per_player() {
        let coordinator = Coordinator::default();
        let (id, alice, bob) = started(&coordinator);
        assert!(coordinator.view(id, &alice).unwrap().your_turn);
        assert!(!coordinator.view(id, &bob).unwrap().your_turn);
        assert_eq!(
            Err(SessionError::UnknownPlayer),
            coordinator.view(id, &"mallory".into()).map(|_| ())
        );
    }
}
