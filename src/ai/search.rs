//! Iterative-deepening negamax with alpha-beta pruning.
//!
//! The searcher owns the transposition table, killer slots and history table
//! and keeps them alive across deepening iterations, so each depth inherits
//! the ordering information of the previous one. Frontier nodes drop into a
//! capture-only quiescence search instead of evaluating directly, which
//! keeps the engine from standing on the wrong side of the horizon in an
//! exchange.

use std::time::Instant;

use crate::ai::evaluation::{Evaluate, INF, MATE, is_mate_score};
use crate::ai::ordering::{HistoryHeuristic, KillerMoves, mvv_lva, order_moves};
use crate::ai::tt::{Bound, TranspositionTable};
use crate::engine::board::Position;
use crate::engine::movegen::{legal_moves, pseudo_legal_moves};
use crate::engine::types::Move;

// =========================================================================
// Parameters & statistics
// =========================================================================

/// Knobs for one `search_root` call.
#[derive(Clone, Debug)]
pub struct SearchParams {
    /// Maximum iterative-deepening depth.
    pub depth: u32,
    /// Soft time budget in milliseconds; 0 means depth alone terminates.
    /// Checked between completed depths only — a partial depth is never
    /// the source of the returned move.
    pub time_limit_ms: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            depth: 6,
            time_limit_ms: 0,
        }
    }
}

/// Counters and results from the most recent search.
#[derive(Clone, Debug, Default)]
pub struct SearchStats {
    /// Interior nodes visited.
    pub nodes: u64,
    /// Quiescence nodes visited.
    pub qnodes: u64,
    /// Transposition-table hits that were deep enough to use.
    pub tt_hits: u64,
    /// Last fully completed depth.
    pub depth: u32,
    /// Score of the returned move, side-to-move perspective.
    pub best_score: i32,
    /// Wall-clock time of the whole search.
    pub time_ms: u64,
}

// =========================================================================
// Searcher
// =========================================================================

/// Single-threaded alpha-beta searcher bound to an evaluation function.
pub struct Searcher<'a> {
    evaluator: &'a dyn Evaluate,
    tt: TranspositionTable,
    killers: KillerMoves,
    history: HistoryHeuristic,
    pub stats: SearchStats,
}

impl<'a> Searcher<'a> {
    pub fn new(evaluator: &'a dyn Evaluate) -> Self {
        Self::with_tt_size(evaluator, TranspositionTable::DEFAULT_SIZE_MB)
    }

    pub fn with_tt_size(evaluator: &'a dyn Evaluate, tt_size_mb: usize) -> Self {
        Searcher {
            evaluator,
            tt: TranspositionTable::new(tt_size_mb),
            killers: KillerMoves::new(),
            history: HistoryHeuristic::new(),
            stats: SearchStats::default(),
        }
    }

    /// Iterative-deepening root search. Returns the best move of the last
    /// completed depth, or `None` when the side to move has no legal moves.
    pub fn search_root(&mut self, pos: &mut Position, params: &SearchParams) -> Option<Move> {
        self.stats = SearchStats::default();
        let start = Instant::now();

        let moves = legal_moves(pos);
        if moves.is_empty() {
            return None;
        }

        let mut best_move = moves[0];
        let mut best_score = -INF;

        for depth in 1..=params.depth.max(1) {
            if params.time_limit_ms > 0
                && depth > 1
                && start.elapsed().as_millis() as u64 >= params.time_limit_ms
            {
                break;
            }

            let mut alpha = -INF;
            let beta = INF;
            let mut current_best = moves[0];
            let mut current_score = -INF;

            for &mv in &moves {
                pos.make_move(mv);
                let score = -self.negamax(pos, depth - 1, -beta, -alpha);
                pos.unmake_move(mv);

                if score > current_score {
                    current_score = score;
                    current_best = mv;
                }
                if score > alpha {
                    alpha = score;
                }
            }

            best_move = current_best;
            best_score = current_score;
            self.stats.depth = depth;

            tracing::debug!(
                depth,
                score = current_score,
                best = %current_best,
                nodes = self.stats.nodes,
                "completed iteration"
            );
        }

        self.stats.best_score = best_score;
        self.stats.time_ms = start.elapsed().as_millis() as u64;
        Some(best_move)
    }

    // ---------------------------------------------------------------------
    // Negamax
    // ---------------------------------------------------------------------

    fn negamax(&mut self, pos: &mut Position, depth: u32, mut alpha: i32, beta: i32) -> i32 {
        self.stats.nodes += 1;

        let hash = pos.zobrist_hash;
        let tt_entry = self.tt.probe(hash);
        if let Some(entry) = tt_entry
            && entry.depth >= depth
        {
            self.stats.tt_hits += 1;
            match entry.bound {
                Bound::Exact => return entry.score,
                Bound::Lower if entry.score >= beta => return entry.score,
                Bound::Upper if entry.score <= alpha => return entry.score,
                _ => {}
            }
        }

        if depth == 0 {
            return self.quiescence(pos, alpha, beta);
        }

        let mut moves = legal_moves(pos);
        if moves.is_empty() {
            // The depth term makes nearer mates score higher.
            return if pos.in_check(pos.side_to_move) {
                -(MATE + depth as i32)
            } else {
                0
            };
        }

        let hash_move = tt_entry.map_or(Move::NULL, |entry| entry.best_move);
        order_moves(&mut moves, hash_move, &self.killers, &self.history, depth);

        let mut best_move = moves[0];
        let mut best_score = -INF;
        let mut bound = Bound::Upper;

        for &mv in &moves {
            pos.make_move(mv);
            let score = -self.negamax(pos, depth - 1, -beta, -alpha);
            pos.unmake_move(mv);

            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
            }
            if alpha >= beta {
                // Quiet cutoff moves feed the ordering heuristics.
                if !mv.is_capture() {
                    self.killers.add(depth, mv);
                    self.history.update(mv, depth);
                }
                // Mate-magnitude bounds are never stored: a mate score probed
                // at a different distance from the root would be wrong.
                if !is_mate_score(beta) {
                    self.tt.store(hash, depth, beta, mv, Bound::Lower);
                }
                return beta;
            }
        }

        if !is_mate_score(best_score) {
            self.tt.store(hash, depth, best_score, best_move, bound);
        }
        best_score
    }

    // ---------------------------------------------------------------------
    // Quiescence
    // ---------------------------------------------------------------------

    /// Capture-only extension of the search beyond the nominal depth.
    fn quiescence(&mut self, pos: &mut Position, mut alpha: i32, beta: i32) -> i32 {
        self.stats.qnodes += 1;

        let stand_pat = self.evaluator.evaluate(pos);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut captures: Vec<Move> = pseudo_legal_moves(pos)
            .into_iter()
            .filter(|mv| mv.is_capture())
            .collect();
        captures.sort_by_key(|&mv| std::cmp::Reverse(mvv_lva(mv)));

        for mv in captures {
            // Legality is checked lazily; most captures never get this far.
            if !pos.is_legal_move(mv) {
                continue;
            }
            pos.make_move(mv);
            let score = -self.quiescence(pos, -beta, -alpha);
            pos.unmake_move(mv);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

// =========================================================================
// Tests
// =========================================================================
