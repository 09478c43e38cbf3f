use std::collections::BTreeMap;

use actix::Message;
use chess::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandError;
use crate::game::Outcome;
use crate::models::game_state::MatchSummary;

/// Seat color as it appears on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCode {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl From<ColorCode> for Color {
    fn from(code: ColorCode) -> Self {
        match code {
            ColorCode::White => Color::White,
            ColorCode::Black => Color::Black,
        }
    }
}

impl From<Color> for ColorCode {
    fn from(color: Color) -> Self {
        match color {
            Color::White => ColorCode::White,
            Color::Black => ColorCode::Black,
        }
    }
}

/// Inbound envelope: `{"command": ..., "payload": {...}}`.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "command", content = "payload", rename_all = "camelCase")]
pub enum Command {
    Create(CreatePayload),
    Join(JoinPayload),
    Move(MovePayload),
    #[serde(alias = "resign")]
    End(EndPayload),
    Moves(MovesPayload),
    Games,
    Ping,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayload {
    #[serde(default)]
    pub name: String,
    pub seat_color: ColorCode,
    #[serde(default)]
    pub position_string: Option<String>,
    #[serde(default)]
    pub times_ms: Option<Vec<Value>>,
    #[serde(default)]
    pub increments_ms: Option<Vec<Value>>,
}

impl CreatePayload {
    /// Both time budgets, when present and numeric. Fractions are truncated.
    pub fn time_budgets(&self) -> Option<[i64; 2]> {
        millisecond_pair(self.times_ms.as_deref()?)
    }

    /// Both increments, zero when absent. `None` when present but unusable.
    pub fn increment_budgets(&self) -> Option<[i64; 2]> {
        match self.increments_ms.as_deref() {
            Some(values) => millisecond_pair(values),
            None => Some([0, 0]),
        }
    }
}

fn millisecond_pair(values: &[Value]) -> Option<[i64; 2]> {
    match values {
        [white, black] => Some([white.as_f64()? as i64, black.as_f64()? as i64]),
        _ => None,
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub match_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub match_id: String,
    pub name: String,
    pub secret_key: String,
    #[serde(rename = "move")]
    pub mv: Value,
    #[serde(default)]
    pub position_string: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EndPayload {
    pub match_id: String,
    pub name: String,
    pub secret_key: String,
    #[serde(default)]
    pub is_draw: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MovesPayload {
    pub match_id: String,
}

/// Outbound message: `{"status": ..., "payload": {...}}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    Created(Created),
    Joined(Joined),
    Moved(Moved),
    GameOver(GameOver),
    Games(GameList),
    Moves(AvailableMoves),
    NoName,
    NameTooLong,
    NameTaken,
    TimeTooShort,
    NotFound,
    NotYourMove,
    Invalid,
}

impl From<CommandError> for ServerMessage {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::NoName => ServerMessage::NoName,
            CommandError::NameTooLong => ServerMessage::NameTooLong,
            CommandError::NameTaken => ServerMessage::NameTaken,
            CommandError::TimeTooShort => ServerMessage::TimeTooShort,
            CommandError::NotFound => ServerMessage::NotFound,
            CommandError::NotYourMove => ServerMessage::NotYourMove,
            CommandError::Invalid => ServerMessage::Invalid,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub secret_key: String,
    pub match_id: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    pub position_string: Option<String>,
    pub secret_key: String,
    pub match_id: String,
    pub names: [Option<String>; 2],
    pub times_ms: [i64; 2],
    pub seat_index: usize,
    pub color: ColorCode,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Moved {
    pub times_ms: [i64; 2],
    #[serde(rename = "move")]
    pub mv: Value,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    pub winner: Outcome,
    pub times_ms: [i64; 2],
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameList {
    pub games: Vec<MatchSummary>,
    pub live_connection_count: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailableMoves {
    pub match_id: String,
    pub destinations: BTreeMap<String, Vec<String>>,
    pub laser_shots: Vec<LaserShot>,
}

/// A laser destination that removes a piece instead of relocating onto it.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaserShot {
    pub from: String,
    pub trigger: String,
    pub target: String,
    pub path: Vec<String>,
}

/// Serialized frame delivered to a connection actor.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct OutboundText(pub String);
