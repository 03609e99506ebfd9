pub mod attacks;
pub mod board;
pub mod movegen;
pub mod types;
pub mod zobrist;

pub use board::{Position, START_FEN};
pub use movegen::{legal_moves, perft, pseudo_legal_moves};
pub use types::*;
