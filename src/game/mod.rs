pub mod board;
pub mod moves;
pub mod result;
pub mod utils;

pub use board::{decode_position, placement_fragment, Board, Piece, PieceKind};
pub use moves::{laser_target, legal_moves, squares_between};
pub use result::{evaluate, Outcome};
