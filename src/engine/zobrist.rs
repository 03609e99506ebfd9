//! Zobrist hashing for incremental position identification.
//!
//! Each aspect of a position (piece on square, side to move, each castling
//! right, en-passant file) gets a random 64-bit key. The position hash is the
//! XOR of all applicable keys, which make/unmake can update in O(1).
//! The generator is seeded with a fixed value so hashes are stable across
//! runs — a requirement for reproducible searches.

use crate::engine::types::{CastlingRights, Color, PieceType, Square};

/// Pre-computed Zobrist random keys (generated once via `OnceLock`).
pub struct ZobristKeys {
    /// piece\[color\]\[piece_type\]\[square\].
    piece: [[[u64; 64]; PieceType::COUNT]; 2],
    /// XOR this when it is Black's turn to move.
    pub side_to_move: u64,
    /// One key per castling right, in WK/WQ/BK/BQ bit order.
    castling: [u64; 4],
    /// One key per possible en-passant file.
    en_passant: [u64; 8],
}

static ZOBRIST: std::sync::OnceLock<ZobristKeys> = std::sync::OnceLock::new();

/// Get a reference to the global Zobrist keys.
pub fn keys() -> &'static ZobristKeys {
    ZOBRIST.get_or_init(ZobristKeys::init)
}

impl ZobristKeys {
    fn init() -> Self {
        let mut rng = Xorshift64::new(0x3243_F6A8_885A_308D); // π digits

        let mut piece = [[[0u64; 64]; PieceType::COUNT]; 2];
        for color in &mut piece {
            for pt in color {
                for sq in pt {
                    *sq = rng.next_u64();
                }
            }
        }

        let side_to_move = rng.next_u64();

        let mut castling = [0u64; 4];
        for key in &mut castling {
            *key = rng.next_u64();
        }

        let mut en_passant = [0u64; 8];
        for key in &mut en_passant {
            *key = rng.next_u64();
        }

        ZobristKeys {
            piece,
            side_to_move,
            castling,
            en_passant,
        }
    }

    /// Key for a specific piece on a specific square.
    #[inline]
    pub fn piece_key(&self, color: Color, piece: PieceType, sq: Square) -> u64 {
        self.piece[color.index()][piece.index()][sq.0 as usize]
    }

    /// Key for a specific en-passant file (0-7).
    #[inline]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }

    /// Combined key for a set of castling rights: the XOR of the per-right
    /// keys for every right that is set.
    #[inline]
    pub fn castling_key(&self, rights: CastlingRights) -> u64 {
        let mut key = 0u64;
        for bit in 0..4 {
            if rights.0 & (1 << bit) != 0 {
                key ^= self.castling[bit];
            }
        }
        key
    }
}

// ---------------------------------------------------------------------------
// Deterministic PRNG (xorshift64)
// ---------------------------------------------------------------------------

struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        // Xorshift maps zero to zero forever; nudge it.
        Xorshift64 {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
