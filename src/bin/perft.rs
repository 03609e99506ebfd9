//! Perft CLI: `perft <depth> [fen]`.
//!
//! Counts leaf nodes of the legal move tree from the given position —
//! the standard way to validate a move generator against published numbers.

use castellan::engine::board::{Position, START_FEN};
use castellan::engine::movegen::perft;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(depth) = args.first().and_then(|d| d.parse::<u32>().ok()) else {
        eprintln!("usage: perft <depth> [fen]");
        std::process::exit(1);
    };

    // Accept the FEN quoted as one argument or spread across several.
    let fen = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        START_FEN.to_string()
    };
    let mut pos = match Position::from_fen(&fen) {
        Ok(pos) => pos,
        Err(err) => {
            eprintln!("invalid FEN: {err}");
            std::process::exit(1);
        }
    };

    println!("Perft({depth}) = {}", perft(&mut pos, depth));
}
