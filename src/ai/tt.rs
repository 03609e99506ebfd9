//! Fixed-size transposition table keyed by Zobrist hash.
//!
//! Open addressing with a single slot per index. Replacement keeps an entry
//! only when it is deeper, same-age and non-empty; everything else is
//! overwritten. An age counter lets a new search reclaim the whole table
//! without touching memory.

use crate::engine::types::Move;

/// How a stored score bounds the true value of the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Score is the exact value for the node.
    Exact,
    /// Search failed high: the true value is >= score.
    Lower,
    /// Search failed low: the true value is <= score.
    Upper,
}

/// One table slot.
#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub depth: u32,
    pub score: i32,
    pub best_move: Move,
    pub bound: Bound,
    pub age: u8,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry {
        key: 0,
        depth: 0,
        score: 0,
        best_move: Move::NULL,
        bound: Bound::Exact,
        age: 0,
    };
}

/// The table itself: a flat vector sized from a MiB budget.
pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    age: u8,
}

impl TranspositionTable {
    /// Default table budget in MiB.
    pub const DEFAULT_SIZE_MB: usize = 16;

    /// Allocate a table using `size_mb` mebibytes.
    pub fn new(size_mb: usize) -> Self {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let capacity = (bytes / std::mem::size_of::<TTEntry>()).max(1);
        TranspositionTable {
            entries: vec![TTEntry::EMPTY; capacity],
            age: 0,
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Record a search result. The slot is replaced when it is empty, holds
    /// a shallower-or-equal entry, or belongs to an earlier search age.
    pub fn store(&mut self, hash: u64, depth: u32, score: i32, best_move: Move, bound: Bound) {
        let age = self.age;
        let idx = self.index(hash);
        let entry = &mut self.entries[idx];
        if entry.key == 0 || entry.depth <= depth || entry.age != age {
            *entry = TTEntry {
                key: hash,
                depth,
                score,
                best_move,
                bound,
                age,
            };
        }
    }

    /// Look up a position. Hits require both the full key and the current
    /// age to match; anything else is treated as absent.
    pub fn probe(&self, hash: u64) -> Option<TTEntry> {
        let entry = self.entries[self.index(hash)];
        (entry.key == hash && entry.age == self.age).then_some(entry)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.key = 0;
        }
    }

    /// Start a new search generation. Older entries stop probing as hits and
    /// become preferred replacement victims.
    pub fn bump_age(&mut self) {
        self.age = self.age.wrapping_add(1);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{PieceType, Square};

    fn mv(from: u8, to: u8) -> Move {
        Move::quiet(Square(from), Square(to), PieceType::Rook)
    }

    #[test]
    fn sized_from_mib_budget() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.capacity(), 1024 * 1024 / std::mem::size_of::<TTEntry>());
        // Zero rounds up to something usable.
        assert!(TranspositionTable::new(0).capacity() >= 1);
    }

    #[test]
    fn store_then_probe_round_trips() {
        let mut tt = TranspositionTable::new(1);
        tt.store(0xDEAD_BEEF, 5, 42, mv(0, 8), Bound::Exact);
        let e = tt.probe(0xDEAD_BEEF).expect("entry should be present");
        assert_eq!(e.depth, 5);
        assert_eq!(e.score, 42);
        assert_eq!(e.best_move, mv(0, 8));
        assert_eq!(e.bound, Bound::Exact);
    }

    #[test]
    fn probe_miss_on_absent_key() {
        let tt = TranspositionTable::new(1);
        assert!(tt.probe(0x1234).is_none());
    }

    #[test]
    fn colliding_key_is_filtered_by_full_compare() {
        let mut tt = TranspositionTable::new(1);
        let cap = tt.capacity() as u64;
        tt.store(7, 3, 10, mv(0, 8), Bound::Exact);
        // Same slot, different key.
        assert!(tt.probe(7 + cap).is_none());
    }

    #[test]
    fn deeper_entry_survives_shallower_store() {
        let mut tt = TranspositionTable::new(1);
        tt.store(99, 8, 100, mv(0, 8), Bound::Exact);
        tt.store(99, 3, -5, mv(8, 16), Bound::Lower);
        let e = tt.probe(99).unwrap();
        assert_eq!(e.depth, 8);
        assert_eq!(e.score, 100);
    }

    #[test]
    fn equal_depth_replaces() {
        let mut tt = TranspositionTable::new(1);
        tt.store(99, 4, 1, mv(0, 8), Bound::Upper);
        tt.store(99, 4, 2, mv(8, 16), Bound::Exact);
        assert_eq!(tt.probe(99).unwrap().score, 2);
    }

    #[test]
    fn bump_age_invalidates_probes_and_frees_slots() {
        let mut tt = TranspositionTable::new(1);
        tt.store(99, 8, 100, mv(0, 8), Bound::Exact);
        tt.bump_age();
        assert!(tt.probe(99).is_none(), "stale-age entries never probe");
        // The deep stale entry no longer blocks a shallow store.
        tt.store(99, 1, 7, mv(8, 16), Bound::Exact);
        assert_eq!(tt.probe(99).unwrap().score, 7);
    }

    #[test]
    fn clear_zeroes_keys() {
        let mut tt = TranspositionTable::new(1);
        tt.store(99, 8, 100, mv(0, 8), Bound::Exact);
        tt.clear();
        assert!(tt.probe(99).is_none());
    }
}
