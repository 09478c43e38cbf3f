use chess::{Color, File, Rank, Square};

/// Seat index of a color: white sits in seat 0, black in seat 1.
pub fn seat_index(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 1,
    }
}

pub fn seat_color(index: usize) -> Color {
    if index == 0 {
        Color::White
    } else {
        Color::Black
    }
}

/// Move `square` by (files, ranks), or `None` if that leaves the board.
pub fn offset(square: Square, (df, dr): (i8, i8)) -> Option<Square> {
    let file = square.get_file().to_index() as i8 + df;
    let rank = square.get_rank().to_index() as i8 + dr;
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::make_square(
            Rank::from_index(rank as usize),
            File::from_index(file as usize),
        ))
    } else {
        None
    }
}
