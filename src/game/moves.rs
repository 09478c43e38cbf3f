//! Legal destinations for the variant's pieces.
//!
//! Rook, knight and king move as in chess (the king may step into attack).
//! Pawns are omnidirectional with their move and capture patterns swapped.
//! The laser slides like a rook without capturing and fires along the
//! diagonals.

use std::collections::HashMap;

use chess::{Color, Square};

use super::board::{Board, PieceKind};
use super::utils::offset;

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];
const KNIGHT: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, 2),
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
];

/// Destinations for every piece of `side` that has at least one.
pub fn legal_moves(board: &Board, side: Color) -> HashMap<Square, Vec<Square>> {
    let mut dests = HashMap::new();
    for (origin, piece) in board.pieces() {
        if piece.color != side {
            continue;
        }
        let mut targets = Vec::new();
        match piece.kind {
            PieceKind::Rook => {
                for dir in ORTHOGONAL {
                    slide(board, origin, dir, side, true, &mut targets);
                }
            }
            PieceKind::Knight => step(board, origin, &KNIGHT, side, &mut targets),
            PieceKind::King => {
                step(board, origin, &DIAGONAL, side, &mut targets);
                step(board, origin, &ORTHOGONAL, side, &mut targets);
            }
            PieceKind::Pawn => {
                targets.extend(
                    DIAGONAL
                        .iter()
                        .filter_map(|&dir| offset(origin, dir))
                        .filter(|&sq| board.piece_on(sq).is_none()),
                );
                targets.extend(
                    ORTHOGONAL
                        .iter()
                        .filter_map(|&dir| offset(origin, dir))
                        .filter(|&sq| matches!(board.piece_on(sq), Some(p) if p.color != side)),
                );
            }
            PieceKind::Laser => {
                for dir in ORTHOGONAL {
                    slide(board, origin, dir, side, false, &mut targets);
                }
                for dir in DIAGONAL {
                    if let Some(target) = laser_shot(board, origin, dir) {
                        targets.push(target);
                    }
                }
            }
        }
        if !targets.is_empty() {
            dests.insert(origin, targets);
        }
    }
    dests
}

fn slide(
    board: &Board,
    origin: Square,
    dir: (i8, i8),
    side: Color,
    captures: bool,
    targets: &mut Vec<Square>,
) {
    let mut current = offset(origin, dir);
    while let Some(sq) = current {
        if let Some(piece) = board.piece_on(sq) {
            if captures && piece.color != side {
                targets.push(sq);
            }
            return;
        }
        targets.push(sq);
        current = offset(sq, dir);
    }
}

fn step(board: &Board, origin: Square, offsets: &[(i8, i8)], side: Color, targets: &mut Vec<Square>) {
    targets.extend(
        offsets
            .iter()
            .filter_map(|&dir| offset(origin, dir))
            .filter(|&sq| board.piece_on(sq).map_or(true, |p| p.color != side)),
    );
}

/// The square that triggers a laser shot along `dir`: the last empty square
/// before the first piece hit. Rooks block the beam and nothing is returned.
fn laser_shot(board: &Board, origin: Square, dir: (i8, i8)) -> Option<Square> {
    let mut last_empty = None;
    let mut current = offset(origin, dir);
    while let Some(sq) = current {
        match board.piece_on(sq) {
            Some(piece) if piece.kind == PieceKind::Rook => return None,
            Some(_) => return last_empty,
            None => last_empty = Some(sq),
        }
        current = offset(sq, dir);
    }
    None
}

/// Square whose occupant is removed when the laser on `origin` selects
/// `trigger`, if that is one of its shot destinations.
pub fn laser_target(board: &Board, origin: Square, trigger: Square) -> Option<Square> {
    if board.piece_on(origin)?.kind != PieceKind::Laser {
        return None;
    }
    let dir = direction(origin, trigger)?;
    if dir.0 == 0 || dir.1 == 0 || laser_shot(board, origin, dir) != Some(trigger) {
        return None;
    }
    offset(trigger, dir)
}

fn direction(from: Square, to: Square) -> Option<(i8, i8)> {
    let df = to.get_file().to_index() as i8 - from.get_file().to_index() as i8;
    let dr = to.get_rank().to_index() as i8 - from.get_rank().to_index() as i8;
    if (df, dr) == (0, 0) || (df != 0 && dr != 0 && df.abs() != dr.abs()) {
        return None;
    }
    Some((df.signum(), dr.signum()))
}

/// Squares strictly between two squares on a shared rank, file or diagonal.
///
/// Occupancy is not checked. Callers pass a laser origin and its target, and
/// everything between those is empty by construction.
pub fn squares_between(from: Square, to: Square) -> Option<Vec<Square>> {
    let dir = direction(from, to)?;
    let mut squares = Vec::new();
    let mut current = offset(from, dir)?;
    while current != to {
        squares.push(current);
        current = offset(current, dir)?;
    }
    Some(squares)
}
