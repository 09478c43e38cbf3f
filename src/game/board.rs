//! Sparse board representation and the position-string adapter.
//!
//! Position strings use FEN piece placement. The variant has no bishops or
//! queens; the queen letter encodes the laser.

use std::collections::HashMap;

use chess::{Color, File, Rank, Square};

use crate::error::PositionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Rook,
    Knight,
    King,
    Pawn,
    Laser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }

    fn from_letter(letter: char) -> Result<Self, PositionError> {
        let color = if letter.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match letter.to_ascii_lowercase() {
            'r' => PieceKind::Rook,
            'n' => PieceKind::Knight,
            'k' => PieceKind::King,
            'p' => PieceKind::Pawn,
            'q' => PieceKind::Laser,
            _ => return Err(PositionError::UnknownPiece(letter)),
        };
        Ok(Piece { kind, color })
    }
}

/// Occupied squares plus the side to move. Built fresh per evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pieces: HashMap<Square, Piece>,
    side_to_move: Color,
}

impl Board {
    pub fn new(side_to_move: Color) -> Self {
        Board {
            pieces: HashMap::new(),
            side_to_move,
        }
    }

    #[cfg(test)]
    pub fn with_piece(mut self, square: Square, piece: Piece) -> Self {
        self.pieces.insert(square, piece);
        self
    }

    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.pieces.get(&square).copied()
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Occupied squares in a1..h8 order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        let mut squares: Vec<_> = self.pieces.iter().map(|(s, p)| (*s, *p)).collect();
        squares.sort_by_key(|(s, _)| s.to_index());
        squares.into_iter()
    }
}

/// Piece-placement part of a position string, used as the repetition key.
pub fn placement_fragment(position: &str) -> &str {
    position.split_whitespace().next().unwrap_or("")
}

pub fn decode_position(position: &str) -> Result<Board, PositionError> {
    let mut fields = position.split_whitespace();
    let placement = fields.next().unwrap_or("");
    let side_to_move = match fields.next() {
        None | Some("w") => Color::White,
        Some("b") => Color::Black,
        Some(other) => return Err(PositionError::SideToMove(other.to_string())),
    };

    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(PositionError::RankCount(ranks.len()));
    }

    let mut board = Board::new(side_to_move);
    for (row, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - row;
        let mut file = 0usize;
        for c in rank_text.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
            } else {
                if file >= 8 {
                    return Err(PositionError::RankWidth(rank + 1));
                }
                let square = Square::make_square(Rank::from_index(rank), File::from_index(file));
                board.pieces.insert(square, Piece::from_letter(c)?);
                file += 1;
            }
        }
        if file != 8 {
            return Err(PositionError::RankWidth(rank + 1));
        }
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sq(name: &str) -> Square {
        Square::from_str(name).unwrap()
    }

    #[test]
    fn decodes_placement_and_side() {
        let board = decode_position("4k3/8/8/8/8/8/3P4/R3K2Q b").unwrap();
        assert_eq!(board.side_to_move(), Color::Black);
        assert_eq!(board.len(), 5);
        assert_eq!(board.piece_on(sq("e8")), Some(Piece::new(PieceKind::King, Color::Black)));
        assert_eq!(board.piece_on(sq("h1")), Some(Piece::new(PieceKind::Laser, Color::White)));
        assert_eq!(board.piece_on(sq("d2")), Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert_eq!(board.piece_on(sq("e4")), None);
    }

    #[test]
    fn missing_side_defaults_to_white() {
        let board = decode_position("8/8/8/8/8/8/8/8").unwrap();
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.len(), 0);
    }

    #[test]
    fn rejects_malformed_positions() {
        assert_eq!(
            decode_position("8/8/8/8/8/8/8/3B4 w"),
            Err(PositionError::UnknownPiece('B'))
        );
        assert_eq!(decode_position("8/8/8 w"), Err(PositionError::RankCount(3)));
        assert_eq!(
            decode_position("9/8/8/8/8/8/8/8 w"),
            Err(PositionError::RankWidth(8))
        );
        assert!(matches!(
            decode_position("8/8/8/8/8/8/8/8 x"),
            Err(PositionError::SideToMove(_))
        ));
    }

    #[test]
    fn fragment_is_placement_field() {
        assert_eq!(placement_fragment("4k3/8/8/8/8/8/8/4K3 w - - 0 1"), "4k3/8/8/8/8/8/8/4K3");
        assert_eq!(placement_fragment(""), "");
    }
}
