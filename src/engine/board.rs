//! Bitboard-based chess position representation.
//!
//! `Position` stores piece placement twice: as 12 bitboards (2 colours × 6
//! piece types, with redundant occupancy unions) and as a 64-square mailbox.
//! The bitboards drive move generation; the mailbox answers "what is on this
//! square" in O(1) for captures and FEN emission. The two must always agree.
//!
//! Moves are applied in place. Every `make_move` pushes an undo record onto
//! an internal LIFO history; `unmake_move` pops it and restores the position
//! byte for byte, including the incrementally-maintained Zobrist hash.

use crate::engine::attacks;
use crate::engine::types::{
    Bitboard, CastlingRights, ChessError, Color, Move, PieceType, Square,
};
use crate::engine::zobrist;

/// The standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// UndoInfo — everything a move destroys
// ---------------------------------------------------------------------------

/// State saved by `make_move` so `unmake_move` can restore it.
#[derive(Clone, Debug)]
struct UndoInfo {
    mv: Move,
    captured: Option<PieceType>,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    zobrist_hash: u64,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
///
/// Board layout follows LERF (Little-Endian Rank-File) mapping:
/// a1 = 0, b1 = 1, … h1 = 7, a2 = 8, … h8 = 63.
#[derive(Clone, Debug)]
pub struct Position {
    /// Piece bitboards: `pieces[color][piece_type]`.
    pub pieces: [[Bitboard; PieceType::COUNT]; 2],

    /// Per-colour occupancy (union of all piece bitboards for that colour).
    pub occupied: [Bitboard; 2],

    /// Total occupancy (union of both colours).
    pub all_occupied: Bitboard,

    /// Mailbox: occupant of each square, if any.
    mailbox: [Option<(Color, PieceType)>; 64],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Half-move clock for the 50-move rule (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,

    /// Incremental Zobrist hash of the position.
    pub zobrist_hash: u64,

    /// LIFO of undo records, one per un-reversed `make_move`.
    history: Vec<UndoInfo>,
}

impl Position {
    /// Create an empty board with no pieces.
    pub fn empty() -> Self {
        Position {
            pieces: [[Bitboard::EMPTY; PieceType::COUNT]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            mailbox: [None; 64],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            zobrist_hash: 0,
            history: Vec::new(),
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen(START_FEN).expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Piece manipulation (low-level)
    // -----------------------------------------------------------------------

    /// Place a piece on a square. Leaves the Zobrist hash stale.
    #[inline]
    pub fn put_piece(&mut self, sq: Square, color: Color, piece: PieceType) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bb;
        self.occupied[color.index()] |= bb;
        self.all_occupied |= bb;
        self.mailbox[sq.0 as usize] = Some((color, piece));
    }

    /// Remove whatever occupies a square, returning it. Leaves the Zobrist
    /// hash stale. No-op on an empty square.
    #[inline]
    pub fn remove_piece(&mut self, sq: Square) -> Option<(Color, PieceType)> {
        let occupant = self.mailbox[sq.0 as usize].take()?;
        let (color, piece) = occupant;
        let bb = !Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] &= bb;
        self.occupied[color.index()] &= bb;
        self.all_occupied &= bb;
        Some(occupant)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, PieceType)> {
        self.mailbox[sq.0 as usize]
    }

    /// Bitboard of all pieces of a given colour and type.
    #[inline]
    pub fn bb(&self, color: Color, piece: PieceType) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    /// Find the king square for the given colour, if that side has a king.
    /// Lenient FEN loading permits kingless boards mid-construction.
    #[inline]
    pub fn king_sq(&self, color: Color) -> Option<Square> {
        self.pieces[color.index()][PieceType::King.index()].lsb()
    }

    /// Number of moves made and not yet unmade.
    #[inline]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    // -----------------------------------------------------------------------
    // Zobrist hash (full recompute)
    // -----------------------------------------------------------------------

    /// Compute the Zobrist hash from scratch. The incremental hash maintained
    /// by make/unmake must always equal this.
    pub fn compute_zobrist(&self) -> u64 {
        let zk = zobrist::keys();
        let mut hash = 0u64;

        for color in [Color::White, Color::Black] {
            for &pt in &PieceType::ALL {
                for sq in self.bb(color, pt).iter() {
                    hash ^= zk.piece_key(color, pt, sq);
                }
            }
        }

        if self.side_to_move == Color::Black {
            hash ^= zk.side_to_move;
        }

        hash ^= zk.castling_key(self.castling_rights);

        if let Some(ep_sq) = self.en_passant {
            hash ^= zk.ep_key(ep_sq.file());
        }

        hash
    }

    // -----------------------------------------------------------------------
    // Consistency check (debug/test builds)
    // -----------------------------------------------------------------------

    /// Verify that occupancy unions and the mailbox agree with the piece
    /// bitboards.
    #[cfg(any(debug_assertions, test))]
    pub fn assert_consistent(&self) {
        for color in [Color::White, Color::Black] {
            let mut expected = Bitboard::EMPTY;
            for &pt in &PieceType::ALL {
                expected |= self.pieces[color.index()][pt.index()];
            }
            assert_eq!(
                self.occupied[color.index()],
                expected,
                "occupancy mismatch for {color:?}",
            );
        }
        assert_eq!(
            self.all_occupied,
            self.occupied[0] | self.occupied[1],
            "all_occupied mismatch",
        );
        for idx in 0..64u8 {
            let sq = Square(idx);
            match self.mailbox[idx as usize] {
                Some((color, piece)) => assert!(
                    self.bb(color, piece).is_set(sq),
                    "mailbox says {color:?} {piece:?} on {sq} but bitboard disagrees",
                ),
                None => assert!(
                    !self.all_occupied.is_set(sq),
                    "mailbox says {sq} empty but occupancy disagrees",
                ),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Superpiece method: project every attacker type outward from `sq` and
    /// intersect with the matching enemy piece set. The pawn lookup uses the
    /// *defender's* colour so the diagonals point the right way.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let t = attacks::tables();
        let occ = self.all_occupied;

        let pawn_atk = t.pawn_attacks(!by, sq);
        if (pawn_atk & self.bb(by, PieceType::Pawn)).is_not_empty() {
            return true;
        }

        if (t.knight_attacks(sq) & self.bb(by, PieceType::Knight)).is_not_empty() {
            return true;
        }

        if (t.king_attacks(sq) & self.bb(by, PieceType::King)).is_not_empty() {
            return true;
        }

        let rook_queen = self.bb(by, PieceType::Rook) | self.bb(by, PieceType::Queen);
        if (t.rook_attacks(sq, occ) & rook_queen).is_not_empty() {
            return true;
        }

        let bishop_queen = self.bb(by, PieceType::Bishop) | self.bb(by, PieceType::Queen);
        if (t.bishop_attacks(sq, occ) & bishop_queen).is_not_empty() {
            return true;
        }

        false
    }

    /// Is the given side's king in check? A kingless side is never in check.
    #[inline]
    pub fn in_check(&self, color: Color) -> bool {
        match self.king_sq(color) {
            Some(king) => self.is_square_attacked(king, !color),
            None => false,
        }
    }

    /// Would this pseudo-legal move leave the mover's own king in check?
    /// Tested on a throwaway clone; the caller's position is untouched.
    pub fn is_legal_move(&self, mv: Move) -> bool {
        let us = self.side_to_move;
        let mut scratch = self.clone();
        scratch.make_move(mv);
        !scratch.in_check(us)
    }

    // -----------------------------------------------------------------------
    // Make / unmake
    // -----------------------------------------------------------------------

    /// Apply a pseudo-legal move for the side to move and push an undo record.
    ///
    /// The caller is responsible for only passing moves produced by the
    /// generator; anything else leaves the position in an undefined state.
    pub fn make_move(&mut self, mv: Move) {
        let zk = zobrist::keys();
        let us = self.side_to_move;
        let them = !us;
        let from = mv.from();
        let to = mv.to();
        let piece = mv.piece();

        let mut undo = UndoInfo {
            mv,
            captured: None,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            zobrist_hash: self.zobrist_hash,
        };

        // ---- Retire the old en-passant file from the hash ----
        if let Some(ep) = self.en_passant {
            self.zobrist_hash ^= zk.ep_key(ep.file());
        }
        self.en_passant = None;

        // ---- Capture on the destination square (non-en-passant) ----
        if let Some((_, victim)) = self.remove_piece(to) {
            self.zobrist_hash ^= zk.piece_key(them, victim, to);
            undo.captured = Some(victim);
        }

        // ---- En passant: the victim pawn sits behind the destination ----
        if mv.is_en_passant() {
            let cap_sq = match us {
                Color::White => Square(to.0 - 8),
                Color::Black => Square(to.0 + 8),
            };
            let _ = self.remove_piece(cap_sq);
            self.zobrist_hash ^= zk.piece_key(them, PieceType::Pawn, cap_sq);
        }

        // ---- Move the piece (promotions land as the new piece) ----
        let _ = self.remove_piece(from);
        self.zobrist_hash ^= zk.piece_key(us, piece, from);

        let landing = mv.promotion().unwrap_or(piece);
        self.put_piece(to, us, landing);
        self.zobrist_hash ^= zk.piece_key(us, landing, to);

        // ---- Castling: bring the rook over ----
        if mv.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(to);
            let _ = self.remove_piece(rook_from);
            self.zobrist_hash ^= zk.piece_key(us, PieceType::Rook, rook_from);
            self.put_piece(rook_to, us, PieceType::Rook);
            self.zobrist_hash ^= zk.piece_key(us, PieceType::Rook, rook_to);
        }

        // ---- Castling rights: any touch of a king/rook home square ----
        let rights_before = self.castling_rights;
        self.castling_rights.0 &= CASTLING_MASK[from.0 as usize];
        self.castling_rights.0 &= CASTLING_MASK[to.0 as usize];
        self.zobrist_hash ^=
            zk.castling_key(rights_before) ^ zk.castling_key(self.castling_rights);

        // ---- Double pawn push opens an en-passant target ----
        if piece == PieceType::Pawn && from.rank().abs_diff(to.rank()) == 2 {
            let ep_sq = Square((from.0 + to.0) / 2); // the skipped square
            self.en_passant = Some(ep_sq);
            self.zobrist_hash ^= zk.ep_key(ep_sq.file());
        }

        // ---- Clocks ----
        if piece == PieceType::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        // ---- Side to move ----
        self.side_to_move = them;
        self.zobrist_hash ^= zk.side_to_move;

        self.history.push(undo);
    }

    /// Reverse the most recent `make_move`. No-op when there is no history.
    pub fn unmake_move(&mut self, mv: Move) {
        let Some(undo) = self.history.pop() else {
            return;
        };
        debug_assert_eq!(undo.mv, mv, "unmake must pair with the last make");

        let them = self.side_to_move;
        let us = !them;
        let from = mv.from();
        let to = mv.to();

        self.side_to_move = us;

        // ---- Lift the landed piece, restore the mover ----
        let _ = self.remove_piece(to);
        let original = if mv.is_promotion() {
            PieceType::Pawn
        } else {
            mv.piece()
        };
        self.put_piece(from, us, original);

        // ---- Restore the capture ----
        if let Some(victim) = undo.captured {
            self.put_piece(to, them, victim);
        }
        if mv.is_en_passant() {
            let cap_sq = match us {
                Color::White => Square(to.0 - 8),
                Color::Black => Square(to.0 + 8),
            };
            self.put_piece(cap_sq, them, PieceType::Pawn);
        }

        // ---- Walk the castling rook back ----
        if mv.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(to);
            let _ = self.remove_piece(rook_to);
            self.put_piece(rook_from, us, PieceType::Rook);
        }

        // ---- Restore saved state ----
        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.zobrist_hash = undo.zobrist_hash;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Castling helpers (free functions)
// ---------------------------------------------------------------------------

/// For a king-destination square (after castling), return (rook_from, rook_to).
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.0 {
        // White kingside: king e1→g1, rook h1→f1.
        6 => (Square(7), Square(5)),
        // White queenside: king e1→c1, rook a1→d1.
        2 => (Square(0), Square(3)),
        // Black kingside: king e8→g8, rook h8→f8.
        62 => (Square(63), Square(61)),
        // Black queenside: king e8→c8, rook a8→d8.
        58 => (Square(56), Square(59)),
        _ => panic!("invalid castling king destination: {king_to}"),
    }
}

/// Mask table indexed by square. When a move touches a square, AND the
/// castling rights with this mask: a rook leaving (or being captured on) its
/// corner drops the matching right, the king's home square drops both.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    mask[0]  = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    mask[7]  = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    mask[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    mask[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    mask[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    mask
};

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl Position {
    /// Parse a FEN string.
    ///
    /// Parsing is deliberately lenient, as chess GUIs routinely send partial
    /// or slightly malformed strings: unknown placement characters are
    /// skipped, and every field after side-to-move may be omitted (castling
    /// defaults to none, en passant to none, clocks to 0 and 1). Only the
    /// placement and side fields are required.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let mut fields = fen.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| ChessError::InvalidFen("missing piece placement".to_string()))?;
        let side = fields
            .next()
            .ok_or_else(|| ChessError::InvalidFen("missing side to move".to_string()))?;

        let mut pos = Position::empty();

        // ----- Field 1: piece placement, rank 8 down to rank 1 -----
        let mut rank: i8 = 7;
        let mut file: i8 = 0;
        for ch in placement.chars() {
            match ch {
                '/' => {
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += (ch as u8 - b'0') as i8,
                _ => {
                    if let Some((color, piece)) = PieceType::from_char(ch) {
                        if (0..8).contains(&file) && (0..8).contains(&rank) {
                            pos.put_piece(
                                Square::from_file_rank(file as u8, rank as u8),
                                color,
                                piece,
                            );
                        }
                        file += 1;
                    }
                    // anything else is skipped
                }
            }
        }

        // ----- Field 2: side to move -----
        pos.side_to_move = if side == "b" { Color::Black } else { Color::White };

        // ----- Field 3: castling availability -----
        pos.castling_rights = fields
            .next()
            .map_or(CastlingRights::NONE, CastlingRights::from_fen);

        // ----- Field 4: en-passant target -----
        pos.en_passant = fields
            .next()
            .and_then(Square::from_algebraic)
            .filter(|sq| sq.rank() == 2 || sq.rank() == 5);

        // ----- Fields 5/6: clocks -----
        pos.halfmove_clock = fields.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        pos.fullmove_number = fields
            .next()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);

        pos.zobrist_hash = pos.compute_zobrist();

        #[cfg(debug_assertions)]
        pos.assert_consistent();

        Ok(pos)
    }

    /// Export the position as a FEN string. Inverse of `from_fen` for any
    /// legal position.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char(color));
                    }
                    None => {
                        empty_count += 1;
                    }
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top).
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                let ch = match self.piece_at(sq) {
                    Some((c, p)) => p.to_char(c),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
