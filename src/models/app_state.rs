use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use actix::Recipient;
use log::{debug, info};

use crate::clock::{ClockFiring, ClockScheduler};
use crate::error::CommandError;
use crate::game::{decode_position, laser_target, legal_moves, squares_between};
use crate::models::directory::{Directory, Finished, JoinOutcome, MoveOutcome, MoveRequest, NewMatch};
use crate::models::game_state::{ClockArm, Match};
use crate::models::lock;
use crate::models::messages::{
    AvailableMoves, Command, CreatePayload, EndPayload, GameList, JoinPayload, LaserShot, MovePayload,
    MovesPayload, OutboundText, ServerMessage,
};
use crate::models::registry::ConnectionRegistry;

/// Application state shared between connections.
///
/// Every match mutation, and every clock arm or cancel that goes with it,
/// happens while holding the directory lock. Clock expiries take the same
/// lock before claiming their token, so a move and an expiry of the same
/// match never interleave. Lock order is directory, then clocks or registry.
#[derive(Default)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub directory: Mutex<Directory>,
    pub clocks: ClockScheduler,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, connection_id: &str, recipient: Recipient<OutboundText>) {
        let live = self.registry.register(connection_id, recipient);
        info!("WebSocket connection started: {} ({} live)", connection_id, live);
    }

    pub fn disconnect(&self, connection_id: &str) {
        let live = self.registry.unregister(connection_id);
        info!("WebSocket connection closed: {} ({} live)", connection_id, live);
        let removed = {
            let mut directory = lock(&self.directory);
            let removed = directory.remove_open_owned_by(connection_id);
            if !removed.is_empty() {
                info!("Removed {} open match(es), {} left", removed.len(), directory.len());
            }
            removed
        };
        if !removed.is_empty() {
            self.broadcast_games();
        }
    }

    pub fn dispatch(self: &Arc<Self>, connection_id: &str, command: Command) {
        match command {
            Command::Create(payload) => self.create(connection_id, payload),
            Command::Join(payload) => self.join(connection_id, payload),
            Command::Move(payload) => self.make_move(connection_id, payload),
            Command::End(payload) => self.end(connection_id, payload),
            Command::Moves(payload) => self.available_moves(connection_id, payload),
            Command::Games => self.send_games(connection_id),
            Command::Ping => debug!("Ping from {}", connection_id),
        }
    }

    fn create(&self, connection_id: &str, payload: CreatePayload) {
        let new = NewMatch {
            times_ms: payload.time_budgets(),
            increments_ms: payload.increment_budgets(),
            name: payload.name,
            seat: payload.seat_color.into(),
            position: payload.position_string,
        };
        let created = lock(&self.directory).create(connection_id, new);
        match created {
            Ok(created) => {
                self.registry.send(connection_id, &ServerMessage::Created(created));
                self.broadcast_games();
            }
            Err(err) => self.reject(connection_id, err),
        }
    }

    fn join(self: &Arc<Self>, connection_id: &str, payload: JoinPayload) {
        let outcome = {
            let mut directory = lock(&self.directory);
            let outcome = directory.join(
                connection_id,
                &payload.match_id,
                &payload.name,
                Instant::now(),
                |id| self.registry.is_live(id),
            );
            if let Ok(JoinOutcome::Joined { match_id, clock, .. }) = &outcome {
                self.arm_clock(match_id, *clock);
            }
            outcome
        };
        match outcome {
            Ok(JoinOutcome::Joined { deliveries, .. }) => {
                for delivery in &deliveries {
                    self.registry.send_many(&delivery.recipients, &delivery.message);
                }
                self.broadcast_games();
            }
            Ok(JoinOutcome::Stale) => {
                self.reject(connection_id, CommandError::NotFound);
                self.broadcast_games();
            }
            Err(err) => self.reject(connection_id, err),
        }
    }

    fn make_move(self: &Arc<Self>, connection_id: &str, payload: MovePayload) {
        let request = MoveRequest {
            match_id: payload.match_id,
            name: payload.name,
            secret_key: payload.secret_key,
            mv: payload.mv,
            position: payload.position_string,
        };
        let match_id = request.match_id.clone();
        let outcome = {
            let mut directory = lock(&self.directory);
            let outcome = directory.apply_move(request, Instant::now());
            match &outcome {
                Ok(MoveOutcome::Continued { clock, .. }) => self.arm_clock(&match_id, *clock),
                Ok(MoveOutcome::Finished(_)) => self.clocks.cancel(&match_id),
                Err(_) => {}
            }
            outcome
        };
        match outcome {
            Ok(MoveOutcome::Continued { broadcast, .. }) => {
                self.registry.send_many(&broadcast.recipients, &broadcast.message);
            }
            Ok(MoveOutcome::Finished(finished)) => self.announce(finished),
            Err(err) => self.reject(connection_id, err),
        }
    }

    fn end(&self, connection_id: &str, payload: EndPayload) {
        let finished = {
            let mut directory = lock(&self.directory);
            let finished = directory.end(&payload.match_id, &payload.name, &payload.secret_key, payload.is_draw);
            if finished.is_ok() {
                self.clocks.cancel(&payload.match_id);
            }
            finished
        };
        match finished {
            Ok(finished) => self.announce(finished),
            Err(err) => self.reject(connection_id, err),
        }
    }

    fn available_moves(&self, connection_id: &str, payload: MovesPayload) {
        let reply = lock(&self.directory)
            .get(&payload.match_id)
            .map(describe_moves)
            .ok_or(CommandError::NotFound);
        match reply {
            Ok(moves) => self.registry.send(connection_id, &ServerMessage::Moves(moves)),
            Err(err) => self.reject(connection_id, err),
        }
    }

    fn send_games(&self, connection_id: &str) {
        self.registry.send(connection_id, &self.games());
    }

    fn broadcast_games(&self) {
        self.registry.send_all(&self.games());
    }

    fn games(&self) -> ServerMessage {
        let games = lock(&self.directory).list();
        ServerMessage::Games(GameList {
            games,
            live_connection_count: self.registry.live_count(),
        })
    }

    /// Caller holds the directory lock.
    fn arm_clock(self: &Arc<Self>, match_id: &str, clock: ClockArm) {
        let state = Arc::clone(self);
        self.clocks
            .arm(match_id, clock.winner, clock.duration, move |firing| state.expire(firing));
    }

    fn expire(&self, firing: ClockFiring) {
        let finished = {
            let mut directory = lock(&self.directory);
            if !self.clocks.claim(&firing) {
                return;
            }
            directory.expire(&firing.match_id, firing.winner)
        };
        if let Some(finished) = finished {
            info!("Match {} ran out of time", finished.match_id);
            self.announce(finished);
        }
    }

    fn announce(&self, finished: Finished) {
        let broadcast = finished.broadcast();
        self.registry.send_many(&broadcast.recipients, &broadcast.message);
        self.broadcast_games();
    }

    fn reject(&self, connection_id: &str, err: CommandError) {
        info!("Rejecting command from {}: {} ({})", connection_id, err.status(), err);
        self.registry.send(connection_id, &ServerMessage::from(err));
    }
}

fn describe_moves(game: &Match) -> AvailableMoves {
    let mut destinations = BTreeMap::new();
    let mut laser_shots = Vec::new();
    if let Some(board) = game.position.as_deref().and_then(|p| decode_position(p).ok()) {
        for (origin, targets) in legal_moves(&board, game.side_to_move) {
            for &trigger in &targets {
                if let Some(target) = laser_target(&board, origin, trigger) {
                    let path = squares_between(origin, target).unwrap_or_default();
                    laser_shots.push(LaserShot {
                        from: origin.to_string(),
                        trigger: trigger.to_string(),
                        target: target.to_string(),
                        path: path.iter().map(ToString::to_string).collect(),
                    });
                }
            }
            destinations.insert(origin.to_string(), targets.iter().map(ToString::to_string).collect());
        }
    }
    laser_shots.sort_by(|a, b| (&a.from, &a.trigger).cmp(&(&b.from, &b.trigger)));
    AvailableMoves {
        match_id: game.id.clone(),
        destinations,
        laser_shots,
    }
}
