//! The set of live matches and every operation that mutates one.
//!
//! Nothing here touches the network or the clock runtime. Operations return
//! what has to be sent and how the clock must be rearmed; the caller holds
//! the directory lock while it applies the clock change.

use std::collections::HashMap;
use std::time::Instant;

use chess::Color;
use log::{info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CommandError;
use crate::game::utils::{seat_color, seat_index};
use crate::game::{decode_position, evaluate, Board, Outcome};
use crate::models::game_state::{ClockArm, Match, MatchSummary, Occupant, Seat};
use crate::models::messages::{Created, GameOver, Joined, Moved, ServerMessage};

pub const MAX_NAME_LEN: usize = 60;

/// Upper bound for a starting clock or an increment: one day.
pub const MAX_BUDGET_MS: i64 = 24 * 60 * 60 * 1000;

/// Parameters of a `create` command after envelope parsing.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub name: String,
    pub seat: Color,
    pub position: Option<String>,
    pub times_ms: Option<[i64; 2]>,
    /// `None` when the client sent increments that cannot be read.
    pub increments_ms: Option<[i64; 2]>,
}

#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub match_id: String,
    pub name: String,
    pub secret_key: String,
    pub mv: Value,
    pub position: Option<String>,
}

/// One message for a set of connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub recipients: Vec<String>,
    pub message: ServerMessage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// Both seats are filled; each entry is addressed to one seat.
    Joined {
        match_id: String,
        clock: ClockArm,
        deliveries: Vec<Broadcast>,
    },
    /// The creator had disconnected and the match was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Continued { clock: ClockArm, broadcast: Broadcast },
    Finished(Finished),
}

/// A match that has just been removed from the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Finished {
    pub match_id: String,
    pub winner: Outcome,
    pub times_ms: [i64; 2],
    pub recipients: Vec<String>,
}

impl Finished {
    fn from_match(game: Match, winner: Outcome) -> Self {
        Finished {
            recipients: game.connections(),
            match_id: game.id,
            winner,
            times_ms: game.clocks_ms,
        }
    }

    pub fn broadcast(&self) -> Broadcast {
        Broadcast {
            recipients: self.recipients.clone(),
            message: ServerMessage::GameOver(GameOver {
                winner: self.winner,
                times_ms: self.times_ms,
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct Directory {
    matches: HashMap<String, Match>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, match_id: &str) -> Option<&Match> {
        self.matches.get(match_id)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn create(&mut self, connection_id: &str, new: NewMatch) -> Result<Created, CommandError> {
        self.check_name(&new.name)?;
        let times_ms = new
            .times_ms
            .filter(|times| times.iter().all(|&ms| ms > 0 && ms <= MAX_BUDGET_MS))
            .ok_or(CommandError::TimeTooShort)?;
        let increments_ms = new
            .increments_ms
            .filter(|increments| increments.iter().all(|&ms| (0..=MAX_BUDGET_MS).contains(&ms)))
            .ok_or(CommandError::TimeTooShort)?;

        let mut match_id = Uuid::new_v4().to_string();
        while self.matches.contains_key(&match_id) {
            match_id = Uuid::new_v4().to_string();
        }
        let secret_key = Uuid::new_v4().to_string();

        let mut seats = [Seat::Empty, Seat::Empty];
        seats[seat_index(new.seat)] = Seat::Occupied(Occupant {
            name: new.name,
            secret_key: secret_key.clone(),
            connection_id: connection_id.to_string(),
        });
        let mut game = Match {
            id: match_id.clone(),
            position: None,
            side_to_move: Color::Black,
            clocks_ms: times_ms,
            increments_ms,
            last_move: None,
            last_move_at: None,
            repetitions: HashMap::new(),
            seats,
        };
        if let Some(position) = new.position.as_deref() {
            game.record_position(position);
        }
        info!("Created match {} for connection {}", match_id, connection_id);
        self.matches.insert(match_id.clone(), game);

        Ok(Created {
            secret_key,
            match_id,
        })
    }

    pub fn join(
        &mut self,
        connection_id: &str,
        match_id: &str,
        name: &str,
        now: Instant,
        is_live: impl Fn(&str) -> bool,
    ) -> Result<JoinOutcome, CommandError> {
        self.check_name(name)?;

        let game = self.matches.get(match_id).ok_or(CommandError::NotFound)?;
        let seat = game.open_seat().ok_or(CommandError::NotFound)?;
        if game.seat_of(name).is_some() {
            return Err(CommandError::NotFound);
        }
        let creator_alive = game.seats[1 - seat]
            .occupant()
            .is_some_and(|creator| is_live(&creator.connection_id));
        if !creator_alive {
            info!("Dropping match {}: its creator is gone", match_id);
            self.matches.remove(match_id);
            return Ok(JoinOutcome::Stale);
        }

        let Some(game) = self.matches.get_mut(match_id) else {
            return Err(CommandError::NotFound);
        };
        game.seats[seat] = Seat::Occupied(Occupant {
            name: name.to_string(),
            secret_key: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
        });
        game.last_move_at = Some(now);

        let names = game.names();
        let deliveries = game
            .seats
            .iter()
            .enumerate()
            .filter_map(|(index, s)| s.occupant().map(|o| (index, o)))
            .map(|(index, occupant)| Broadcast {
                recipients: vec![occupant.connection_id.clone()],
                message: ServerMessage::Joined(Joined {
                    position_string: game.position.clone(),
                    secret_key: occupant.secret_key.clone(),
                    match_id: game.id.clone(),
                    names: names.clone(),
                    times_ms: game.clocks_ms,
                    seat_index: index,
                    color: seat_color(index).into(),
                }),
            })
            .collect();
        info!("Connection {} joined match {}", connection_id, match_id);

        Ok(JoinOutcome::Joined {
            match_id: game.id.clone(),
            clock: game.clock_arm(),
            deliveries,
        })
    }

    pub fn apply_move(&mut self, request: MoveRequest, now: Instant) -> Result<MoveOutcome, CommandError> {
        let seat = self.authenticate(&request.match_id, &request.name, &request.secret_key)?;
        let Some(game) = self.matches.get_mut(&request.match_id) else {
            return Err(CommandError::Invalid);
        };
        if !game.is_active() || seat_color(seat) != game.side_to_move {
            return Err(CommandError::NotYourMove);
        }
        let new_board = match request.position.as_deref() {
            Some(position) => Some(decode_position(position).map_err(|e| {
                warn!("Rejecting move in {}: {}", request.match_id, e);
                CommandError::Invalid
            })?),
            None => None,
        };

        game.charge_clock(seat, now);
        game.side_to_move = !game.side_to_move;
        game.last_move = Some(request.mv.clone());
        if let Some(position) = request.position.as_deref() {
            game.record_position(position);
        }

        let board: Option<Board> = new_board.or_else(|| {
            game.position
                .as_deref()
                .and_then(|p| decode_position(p).ok())
        });
        if let Some(winner) = board.and_then(|b| evaluate(&b, &game.repetitions)) {
            let finished = self.finish(&request.match_id, winner);
            return finished.map(MoveOutcome::Finished).ok_or(CommandError::Invalid);
        }

        Ok(MoveOutcome::Continued {
            clock: game.clock_arm(),
            broadcast: Broadcast {
                recipients: game.connections(),
                message: ServerMessage::Moved(Moved {
                    times_ms: game.clocks_ms,
                    mv: request.mv,
                }),
            },
        })
    }

    /// Resignation, or an agreed draw when `is_draw` is set.
    pub fn end(
        &mut self,
        match_id: &str,
        name: &str,
        secret_key: &str,
        is_draw: bool,
    ) -> Result<Finished, CommandError> {
        let seat = self.authenticate(match_id, name, secret_key)?;
        let winner = if is_draw {
            Outcome::Draw
        } else {
            Outcome::winner(!seat_color(seat))
        };
        self.finish(match_id, winner).ok_or(CommandError::Invalid)
    }

    /// Time ran out for the side that is not `winner`.
    pub fn expire(&mut self, match_id: &str, winner: Color) -> Option<Finished> {
        self.matches.get_mut(match_id)?.flag(winner);
        self.finish(match_id, Outcome::winner(winner))
    }

    /// Matches with a free seat, in id order.
    pub fn list(&self) -> Vec<MatchSummary> {
        let mut open: Vec<_> = self
            .matches
            .values()
            .filter(|m| m.is_open())
            .map(Match::summary)
            .collect();
        open.sort_by(|a, b| a.id.cmp(&b.id));
        open
    }

    /// Drop open matches created by a connection that has gone away.
    pub fn remove_open_owned_by(&mut self, connection_id: &str) -> Vec<String> {
        let stale: Vec<String> = self
            .matches
            .values()
            .filter(|m| m.is_open() && m.connections().iter().any(|c| c == connection_id))
            .map(|m| m.id.clone())
            .collect();
        for id in &stale {
            info!("Removing open match {} after its creator left", id);
            self.matches.remove(id);
        }
        stale
    }

    fn finish(&mut self, match_id: &str, winner: Outcome) -> Option<Finished> {
        let game = self.matches.remove(match_id)?;
        info!("Match {} over, winner {:?}", match_id, winner);
        Some(Finished::from_match(game, winner))
    }

    fn authenticate(&self, match_id: &str, name: &str, secret_key: &str) -> Result<usize, CommandError> {
        let game = self.matches.get(match_id).ok_or(CommandError::Invalid)?;
        let seat = game.seat_of(name).ok_or(CommandError::Invalid)?;
        match game.seats[seat].occupant() {
            Some(occupant) if occupant.secret_key == secret_key => Ok(seat),
            _ => Err(CommandError::Invalid),
        }
    }

    fn check_name(&self, name: &str) -> Result<(), CommandError> {
        if name.is_empty() {
            return Err(CommandError::NoName);
        }
        if name.encode_utf16().count() > MAX_NAME_LEN {
            return Err(CommandError::NameTooLong);
        }
        let taken = self
            .matches
            .values()
            .filter(|m| m.is_open())
            .any(|m| m.seat_of(name).is_some());
        if taken {
            return Err(CommandError::NameTaken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    const START: &str = "rnkq4/pppp4/8/8/8/8/4PPPP/4QKNR b";

    fn new_match(name: &str, seat: Color) -> NewMatch {
        NewMatch {
            name: name.to_string(),
            seat,
            position: Some(START.to_string()),
            times_ms: Some([60_000, 60_000]),
            increments_ms: Some([0, 0]),
        }
    }

    /// White "A" on conn-a, black "B" on conn-b, joined at `t0`.
    fn active_match(directory: &mut Directory, t0: Instant, increments: [i64; 2]) -> (String, String, String) {
        let created = directory
            .create("conn-a", NewMatch { increments_ms: Some(increments), ..new_match("A", Color::White) })
            .unwrap();
        let outcome = directory
            .join("conn-b", &created.match_id, "B", t0, |_| true)
            .unwrap();
        let JoinOutcome::Joined { deliveries, .. } = outcome else {
            panic!("expected a join");
        };
        let black_key = match &deliveries[1].message {
            ServerMessage::Joined(joined) => joined.secret_key.clone(),
            other => panic!("unexpected {other:?}"),
        };
        (created.match_id, created.secret_key, black_key)
    }

    fn mv(match_id: &str, name: &str, key: &str, position: Option<&str>) -> MoveRequest {
        MoveRequest {
            match_id: match_id.to_string(),
            name: name.to_string(),
            secret_key: key.to_string(),
            mv: json!({"from": "a7", "to": "b6"}),
            position: position.map(str::to_string),
        }
    }

    #[test]
    fn create_validates_names_and_times() {
        let mut directory = Directory::new();
        assert_eq!(directory.create("c", new_match("", Color::White)), Err(CommandError::NoName));
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(directory.create("c", new_match(&long, Color::White)), Err(CommandError::NameTooLong));
        assert!(directory.create("c", new_match(&"x".repeat(MAX_NAME_LEN), Color::White)).is_ok());

        let no_time = NewMatch { times_ms: None, ..new_match("A", Color::White) };
        assert_eq!(directory.create("c", no_time), Err(CommandError::TimeTooShort));
        let zero = NewMatch { times_ms: Some([60_000, 0]), ..new_match("A", Color::White) };
        assert_eq!(directory.create("c", zero), Err(CommandError::TimeTooShort));
        let negative_inc = NewMatch { increments_ms: Some([-1, 0]), ..new_match("A", Color::White) };
        assert_eq!(directory.create("c", negative_inc), Err(CommandError::TimeTooShort));
        let unreadable_inc = NewMatch { increments_ms: None, ..new_match("A", Color::White) };
        assert_eq!(directory.create("c", unreadable_inc), Err(CommandError::TimeTooShort));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn create_rejects_budgets_beyond_a_day() {
        let mut directory = Directory::new();
        let huge_inc = NewMatch { increments_ms: Some([0, i64::MAX]), ..new_match("A", Color::White) };
        assert_eq!(directory.create("c", huge_inc), Err(CommandError::TimeTooShort));
        let huge_time = NewMatch { times_ms: Some([i64::MAX, 60_000]), ..new_match("A", Color::White) };
        assert_eq!(directory.create("c", huge_time), Err(CommandError::TimeTooShort));
        let widest = NewMatch {
            times_ms: Some([MAX_BUDGET_MS, MAX_BUDGET_MS]),
            increments_ms: Some([MAX_BUDGET_MS, MAX_BUDGET_MS]),
            ..new_match("A", Color::White)
        };
        assert!(directory.create("c", widest).is_ok());
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn name_length_counts_utf16_units() {
        let mut directory = Directory::new();
        // Each of these takes two UTF-16 units.
        let astral = "\u{1F600}".repeat(MAX_NAME_LEN / 2);
        assert!(directory.create("c", new_match(&astral, Color::White)).is_ok());
        let over = "\u{1F600}".repeat(MAX_NAME_LEN / 2 + 1);
        assert_eq!(directory.create("c", new_match(&over, Color::Black)), Err(CommandError::NameTooLong));
    }

    #[test]
    fn created_match_waits_for_black_to_move() {
        let mut directory = Directory::new();
        let created = directory.create("c", new_match("A", Color::Black)).unwrap();
        let game = directory.get(&created.match_id).unwrap();
        assert_eq!(game.side_to_move, Color::Black);
        assert_eq!(game.seats[0], Seat::Empty);
        assert_eq!(game.seats[1].name(), Some("A"));
        assert_eq!(game.repetitions.get("rnkq4/pppp4/8/8/8/8/4PPPP/4QKNR"), Some(&1));
    }

    #[test]
    fn open_names_are_unique_until_the_match_fills() {
        let mut directory = Directory::new();
        let first = directory.create("c1", new_match("A", Color::White)).unwrap();
        assert_eq!(directory.create("c2", new_match("A", Color::Black)), Err(CommandError::NameTaken));

        directory.join("c2", &first.match_id, "B", Instant::now(), |_| true).unwrap();
        assert!(directory.create("c3", new_match("A", Color::White)).is_ok());
    }

    #[test]
    fn join_rejects_own_name_and_unknown_matches() {
        let mut directory = Directory::new();
        let created = directory.create("c1", new_match("A", Color::White)).unwrap();
        let now = Instant::now();
        assert_eq!(directory.join("c2", &created.match_id, "A", now, |_| true), Err(CommandError::NameTaken));
        assert_eq!(directory.join("c2", "nope", "B", now, |_| true), Err(CommandError::NotFound));
        assert_eq!(directory.join("c2", &created.match_id, "", now, |_| true), Err(CommandError::NoName));

        directory.join("c2", &created.match_id, "B", now, |_| true).unwrap();
        assert_eq!(directory.join("c3", &created.match_id, "C", now, |_| true), Err(CommandError::NotFound));
    }

    #[test]
    fn join_hands_each_seat_its_own_key() {
        let mut directory = Directory::new();
        let created = directory.create("conn-a", new_match("A", Color::White)).unwrap();
        let outcome = directory
            .join("conn-b", &created.match_id, "B", Instant::now(), |_| true)
            .unwrap();
        let JoinOutcome::Joined { clock, deliveries, .. } = outcome else {
            panic!("expected a join");
        };
        assert_eq!(clock.winner, Color::White);
        assert_eq!(clock.duration, Duration::from_millis(60_000));

        let joined: Vec<_> = deliveries
            .iter()
            .map(|d| match &d.message {
                ServerMessage::Joined(j) => (d.recipients[0].clone(), j.clone()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(joined[0].0, "conn-a");
        assert_eq!(joined[0].1.secret_key, created.secret_key);
        assert_eq!(joined[1].0, "conn-b");
        assert_ne!(joined[1].1.secret_key, created.secret_key);
        assert_eq!(joined[1].1.seat_index, 1);
        assert_eq!(joined[0].1.names, [Some("A".to_string()), Some("B".to_string())]);
        assert_eq!(joined[0].1.position_string.as_deref(), Some(START));
    }

    #[test]
    fn join_drops_match_of_departed_creator() {
        let mut directory = Directory::new();
        let created = directory.create("conn-a", new_match("A", Color::White)).unwrap();
        let outcome = directory.join("conn-b", &created.match_id, "B", Instant::now(), |id| id != "conn-a");
        assert_eq!(outcome, Ok(JoinOutcome::Stale));
        assert!(directory.get(&created.match_id).is_none());
    }

    #[test]
    fn listing_skips_full_matches_and_hides_keys() {
        let mut directory = Directory::new();
        let open = directory.create("c1", new_match("A", Color::White)).unwrap();
        let full = directory.create("c2", new_match("B", Color::White)).unwrap();
        directory.join("c3", &full.match_id, "C", Instant::now(), |_| true).unwrap();

        let listed = directory.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, open.match_id);
        let text = serde_json::to_string(&listed).unwrap();
        assert!(!text.contains(&open.secret_key));
        assert!(!text.contains("c1"));
    }

    #[test]
    fn largest_increment_keeps_the_clock_counting() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, _, black_key) = active_match(&mut directory, t0, [0, MAX_BUDGET_MS]);

        let t1 = t0 + Duration::from_millis(500);
        let outcome = directory.apply_move(mv(&id, "B", &black_key, None), t1).unwrap();
        let MoveOutcome::Continued { clock, .. } = outcome else {
            panic!("game should continue");
        };
        assert_eq!(clock.winner, Color::Black);
        assert_eq!(clock.duration, Duration::from_millis(60_000));
        let game = directory.get(&id).unwrap();
        assert_eq!(game.clocks_ms, [60_000, 60_000 - 500 + MAX_BUDGET_MS]);
    }

    #[test]
    fn moves_alternate_from_black_and_charge_the_mover() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, white_key, black_key) = active_match(&mut directory, t0, [0, 2_000]);

        assert_eq!(
            directory.apply_move(mv(&id, "A", &white_key, None), t0),
            Err(CommandError::NotYourMove)
        );

        let t1 = t0 + Duration::from_millis(1_500);
        let outcome = directory.apply_move(mv(&id, "B", &black_key, None), t1).unwrap();
        let MoveOutcome::Continued { clock, broadcast } = outcome else {
            panic!("game should continue");
        };
        assert_eq!(broadcast.recipients, vec!["conn-a".to_string(), "conn-b".to_string()]);
        match broadcast.message {
            ServerMessage::Moved(moved) => assert_eq!(moved.times_ms, [60_000, 60_000 - 1_500 + 2_000]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(clock.winner, Color::Black);
        assert_eq!(clock.duration, Duration::from_millis(60_000));

        assert_eq!(
            directory.apply_move(mv(&id, "B", &black_key, None), t1),
            Err(CommandError::NotYourMove)
        );
        let t2 = t1 + Duration::from_millis(700);
        directory.apply_move(mv(&id, "A", &white_key, None), t2).unwrap();
        let game = directory.get(&id).unwrap();
        assert_eq!(game.clocks_ms, [59_300, 60_500]);
        assert_eq!(game.side_to_move, Color::Black);
    }

    #[test]
    fn moves_require_matching_key() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, white_key, _) = active_match(&mut directory, t0, [0, 0]);
        assert_eq!(directory.apply_move(mv(&id, "B", &white_key, None), t0), Err(CommandError::Invalid));
        assert_eq!(directory.apply_move(mv(&id, "Z", &white_key, None), t0), Err(CommandError::Invalid));
        assert_eq!(directory.apply_move(mv("gone", "A", &white_key, None), t0), Err(CommandError::Invalid));
        assert_eq!(directory.get(&id).unwrap().side_to_move, Color::Black);
    }

    #[test]
    fn move_before_opponent_joins_is_refused() {
        let mut directory = Directory::new();
        let created = directory.create("c1", new_match("A", Color::Black)).unwrap();
        assert_eq!(
            directory.apply_move(mv(&created.match_id, "A", &created.secret_key, None), Instant::now()),
            Err(CommandError::NotYourMove)
        );
    }

    #[test]
    fn undecodable_position_leaves_match_untouched() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, _, black_key) = active_match(&mut directory, t0, [0, 0]);
        let later = t0 + Duration::from_millis(400);
        assert_eq!(
            directory.apply_move(mv(&id, "B", &black_key, Some("not/a/position")), later),
            Err(CommandError::Invalid)
        );
        let game = directory.get(&id).unwrap();
        assert_eq!(game.clocks_ms, [60_000, 60_000]);
        assert_eq!(game.side_to_move, Color::Black);
    }

    #[test]
    fn terminal_position_ends_the_match() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, _, black_key) = active_match(&mut directory, t0, [0, 0]);
        // black pawn reaches a1
        let outcome = directory
            .apply_move(mv(&id, "B", &black_key, Some("k7/8/8/8/8/8/8/p6K w")), t0)
            .unwrap();
        match outcome {
            MoveOutcome::Finished(finished) => {
                assert_eq!(finished.winner, Outcome::Black);
                assert_eq!(finished.recipients.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(directory.get(&id).is_none());
    }

    #[test]
    fn third_repetition_draws() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, white_key, black_key) = active_match(&mut directory, t0, [0, 0]);
        let a = "k7/8/8/8/8/8/8/6RK w";
        let b = "1k6/8/8/8/8/8/8/6RK b";
        let plies = [("B", &black_key, a), ("A", &white_key, b), ("B", &black_key, a), ("A", &white_key, b)];
        for (name, key, position) in plies {
            let outcome = directory.apply_move(mv(&id, name, key, Some(position)), t0).unwrap();
            assert!(matches!(outcome, MoveOutcome::Continued { .. }));
        }
        let outcome = directory.apply_move(mv(&id, "B", &black_key, Some(a)), t0).unwrap();
        assert!(matches!(outcome, MoveOutcome::Finished(Finished { winner: Outcome::Draw, .. })));
    }

    #[test]
    fn resignation_and_draw() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, white_key, _) = active_match(&mut directory, t0, [0, 0]);
        assert_eq!(directory.end(&id, "A", "wrong", false), Err(CommandError::Invalid));
        let finished = directory.end(&id, "A", &white_key, false).unwrap();
        assert_eq!(finished.winner, Outcome::Black);
        assert_eq!(directory.end(&id, "A", &white_key, false), Err(CommandError::Invalid));

        let (id, _, black_key) = active_match(&mut directory, t0, [0, 0]);
        assert_eq!(directory.end(&id, "B", &black_key, true).unwrap().winner, Outcome::Draw);
    }

    #[test]
    fn expiry_zeroes_the_loser() {
        let mut directory = Directory::new();
        let t0 = Instant::now();
        let (id, _, _) = active_match(&mut directory, t0, [0, 0]);
        let finished = directory.expire(&id, Color::White).unwrap();
        assert_eq!(finished.winner, Outcome::White);
        assert_eq!(finished.times_ms, [60_000, 0]);
        assert!(directory.expire(&id, Color::White).is_none());
    }

    #[test]
    fn disconnect_removes_only_open_matches_of_that_connection() {
        let mut directory = Directory::new();
        let open = directory.create("conn-a", new_match("A", Color::White)).unwrap();
        let t0 = Instant::now();
        let active = directory.create("conn-a", new_match("A2", Color::White)).unwrap().match_id;
        directory.join("conn-b", &active, "B", t0, |_| true).unwrap();
        assert_eq!(directory.remove_open_owned_by("conn-a"), vec![open.match_id.clone()]);
        assert!(directory.get(&open.match_id).is_none());
        assert!(directory.get(&active).is_some());
        assert!(directory.remove_open_owned_by("conn-a").is_empty());
    }
}
