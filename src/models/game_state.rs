use std::collections::HashMap;
use std::time::{Duration, Instant};

use chess::Color;
use serde::Serialize;
use serde_json::Value;

use crate::game::utils::seat_index;
use crate::models::messages::ColorCode;

/// A player sitting in one of the two seats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub name: String,
    pub secret_key: String,
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seat {
    Empty,
    Occupied(Occupant),
}

impl Seat {
    pub fn occupant(&self) -> Option<&Occupant> {
        match self {
            Seat::Empty => None,
            Seat::Occupied(occupant) => Some(occupant),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.occupant().map(|o| o.name.as_str())
    }
}

/// What the clock should do after a mutation: count down `duration` and
/// award the game to `winner` if it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockArm {
    pub winner: Color,
    pub duration: Duration,
}

/// Authoritative state of one match.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: String,
    pub position: Option<String>,
    pub side_to_move: Color,
    pub clocks_ms: [i64; 2],
    pub increments_ms: [i64; 2],
    pub last_move: Option<Value>,
    pub last_move_at: Option<Instant>,
    pub repetitions: HashMap<String, u32>,
    pub seats: [Seat; 2],
}

impl Match {
    /// Both seats filled.
    pub fn is_active(&self) -> bool {
        self.seats.iter().all(|s| matches!(s, Seat::Occupied(_)))
    }

    pub fn is_open(&self) -> bool {
        !self.is_active()
    }

    pub fn open_seat(&self) -> Option<usize> {
        self.seats.iter().position(|s| matches!(s, Seat::Empty))
    }

    pub fn seat_of(&self, name: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.name() == Some(name))
    }

    pub fn names(&self) -> [Option<String>; 2] {
        [
            self.seats[0].name().map(str::to_owned),
            self.seats[1].name().map(str::to_owned),
        ]
    }

    pub fn connections(&self) -> Vec<String> {
        self.seats
            .iter()
            .filter_map(Seat::occupant)
            .map(|o| o.connection_id.clone())
            .collect()
    }

    /// Count one more occurrence of `position`'s placement.
    pub fn record_position(&mut self, position: &str) {
        let fragment = crate::game::placement_fragment(position).to_string();
        *self.repetitions.entry(fragment).or_insert(0) += 1;
        self.position = Some(position.to_string());
    }

    /// Charge `seat` for the time since the previous move and credit its increment.
    pub fn charge_clock(&mut self, seat: usize, now: Instant) {
        let elapsed = self
            .last_move_at
            .map(|at| i64::try_from(now.saturating_duration_since(at).as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        self.clocks_ms[seat] = self.clocks_ms[seat]
            .saturating_sub(elapsed)
            .saturating_add(self.increments_ms[seat]);
        self.last_move_at = Some(now);
    }

    /// Countdown for the side to move: if it runs out, the other side wins.
    pub fn clock_arm(&self) -> ClockArm {
        let remaining = self.clocks_ms[seat_index(self.side_to_move)].max(0) as u64;
        ClockArm {
            winner: !self.side_to_move,
            duration: Duration::from_millis(remaining),
        }
    }

    /// Flag the side that is not `winner` with an empty clock.
    pub fn flag(&mut self, winner: Color) {
        self.clocks_ms[seat_index(!winner)] = 0;
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            id: self.id.clone(),
            position_string: self.position.clone(),
            side_to_move: self.side_to_move.into(),
            names: self.names(),
            times_ms: self.clocks_ms,
            increments_ms: self.increments_ms,
            last_move: self.last_move.clone(),
        }
    }
}

/// Listing entry with keys and connection ids stripped.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: String,
    pub position_string: Option<String>,
    pub side_to_move: ColorCode,
    pub names: [Option<String>; 2],
    pub times_ms: [i64; 2],
    pub increments_ms: [i64; 2],
    pub last_move: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(clocks_ms: [i64; 2], increments_ms: [i64; 2]) -> Match {
        Match {
            id: "m".to_string(),
            position: None,
            side_to_move: Color::Black,
            clocks_ms,
            increments_ms,
            last_move: None,
            last_move_at: None,
            repetitions: HashMap::new(),
            seats: [Seat::Empty, Seat::Empty],
        }
    }

    #[test]
    fn charge_clock_saturates_instead_of_wrapping() {
        let t0 = Instant::now();
        let mut game = fresh([i64::MAX, i64::MIN + 1], [i64::MAX, 0]);
        game.charge_clock(0, t0);
        assert_eq!(game.clocks_ms[0], i64::MAX);

        game.charge_clock(1, t0 + Duration::from_millis(10));
        assert_eq!(game.clocks_ms[1], i64::MIN);
        assert_eq!(game.last_move_at, Some(t0 + Duration::from_millis(10)));
    }

    #[test]
    fn clock_arm_floors_an_overdrawn_clock() {
        let mut game = fresh([5_000, -20], [0, 0]);
        assert_eq!(
            game.clock_arm(),
            ClockArm { winner: Color::White, duration: Duration::ZERO }
        );
        game.side_to_move = Color::White;
        assert_eq!(game.clock_arm().duration, Duration::from_millis(5_000));
    }
}
