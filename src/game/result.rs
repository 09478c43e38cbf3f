use std::collections::HashMap;
use std::str::FromStr;

use chess::{Color, Square};
use serde::{Deserialize, Serialize};

use super::board::{Board, PieceKind};

/// Pawn goal squares. The two sets are deliberately not mirror images.
pub const WHITE_GOALS: [&str; 7] = ["h5", "h6", "h7", "h8", "e8", "f8", "g8"];
pub const BLACK_GOALS: [&str; 7] = ["a1", "a2", "a3", "a4", "b1", "c1", "d1"];

/// Occurrence count of a placement that draws the game.
pub const REPETITION_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
    #[serde(rename = "d")]
    Draw,
}

impl Outcome {
    pub fn winner(color: Color) -> Self {
        match color {
            Color::White => Outcome::White,
            Color::Black => Outcome::Black,
        }
    }
}

/// Decide whether the game is over. `None` means play continues.
pub fn evaluate(board: &Board, repetitions: &HashMap<String, u32>) -> Option<Outcome> {
    let mut white_king = false;
    let mut black_king = false;
    let mut knights = false;
    for (_, piece) in board.pieces() {
        match (piece.kind, piece.color) {
            (PieceKind::King, Color::White) => white_king = true,
            (PieceKind::King, Color::Black) => black_king = true,
            (PieceKind::Knight, _) => knights = true,
            _ => {}
        }
    }

    match (white_king, black_king) {
        (false, false) => return Some(Outcome::Draw),
        (true, false) => return Some(Outcome::White),
        (false, true) => return Some(Outcome::Black),
        (true, true) => {}
    }

    if pawn_on_goal(board, &WHITE_GOALS, Color::White) {
        return Some(Outcome::White);
    }
    if pawn_on_goal(board, &BLACK_GOALS, Color::Black) {
        return Some(Outcome::Black);
    }

    // Both kings are on the board here.
    if board.len() <= 3 && (board.len() == 2 || knights) {
        return Some(Outcome::Draw);
    }

    if repetitions.values().any(|&count| count == REPETITION_LIMIT) {
        return Some(Outcome::Draw);
    }

    None
}

fn pawn_on_goal(board: &Board, goals: &[&str], color: Color) -> bool {
    goals
        .iter()
        .filter_map(|name| Square::from_str(name).ok())
        .filter_map(|sq| board.piece_on(sq))
        .any(|p| p.kind == PieceKind::Pawn && p.color == color)
}
