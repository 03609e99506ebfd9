//! The UCI session: a thin text protocol over the engine core.
//!
//! All command handling lives in [`Session::handle`], which maps one input
//! line to the lines the engine prints in response — so the protocol logic
//! is unit-testable without touching stdin/stdout. `run` is the I/O shell
//! around it. Diagnostics go to stderr via `tracing`; stdout carries only
//! protocol output.

use std::io::{self, BufRead, Write};

use crate::ai::evaluation::{Evaluate, StaticEvaluator};
use crate::ai::remote::RemoteEvaluator;
use crate::ai::search::{SearchParams, Searcher};
use crate::config::EngineConfig;
use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::types::{PieceType, Square};

/// One UCI dialogue: the current position plus search settings.
pub struct Session {
    position: Position,
    params: SearchParams,
    tt_size_mb: usize,
    evaluator: Box<dyn Evaluate>,
}

impl Session {
    pub fn new(config: &EngineConfig) -> Self {
        let evaluator: Box<dyn Evaluate> = match &config.eval_url {
            Some(url) => {
                tracing::info!(%url, "using remote evaluation service");
                Box::new(RemoteEvaluator::new(url.clone()))
            }
            None => Box::new(StaticEvaluator),
        };

        Session {
            position: Position::starting(),
            params: SearchParams {
                depth: config.depth,
                time_limit_ms: config.movetime_ms,
            },
            tt_size_mb: config.tt_size_mb,
            evaluator,
        }
    }

    /// Current position, mainly for tests.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Process one input line and return the lines to print.
    /// Unknown commands and unusable arguments are ignored, per protocol
    /// custom — a GUI may speak a newer dialect than we do.
    pub fn handle(&mut self, line: &str) -> Vec<String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.split_first() {
            Some((&"uci", _)) => vec![
                format!("id name castellan {}", env!("CARGO_PKG_VERSION")),
                "id author the castellan authors".to_string(),
                "uciok".to_string(),
            ],
            Some((&"isready", _)) => vec!["readyok".to_string()],
            Some((&"ucinewgame", _)) => {
                self.position = Position::starting();
                Vec::new()
            }
            Some((&"position", rest)) => {
                self.cmd_position(rest);
                Vec::new()
            }
            Some((&"go", rest)) => self.cmd_go(rest),
            // Single-threaded search: by the time `stop` arrives the move is
            // already out.
            Some((&"stop", _)) => Vec::new(),
            _ => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // position
    // -----------------------------------------------------------------------

    fn cmd_position(&mut self, rest: &[&str]) {
        let moves_at = rest.iter().position(|&t| t == "moves");
        let (setup, moves) = match moves_at {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, &[][..]),
        };

        match setup.split_first() {
            Some((&"startpos", _)) => self.position = Position::starting(),
            Some((&"fen", fen_fields)) => match Position::from_fen(&fen_fields.join(" ")) {
                Ok(pos) => self.position = pos,
                Err(err) => {
                    tracing::warn!(%err, "ignoring unusable position command");
                    return;
                }
            },
            _ => return,
        }

        for token in moves {
            self.apply_uci_move(token);
        }
    }

    /// Match a UCI move token against the legal moves and play it.
    /// Tokens that match nothing are dropped silently.
    fn apply_uci_move(&mut self, token: &str) {
        let Some((from, to, promo)) = parse_uci_move(token) else {
            tracing::debug!(token, "unparseable move token");
            return;
        };
        for mv in legal_moves(&self.position) {
            if mv.from() == from && mv.to() == to && mv.promotion() == promo {
                self.position.make_move(mv);
                return;
            }
        }
        tracing::debug!(token, "move matches no legal move; ignored");
    }

    // -----------------------------------------------------------------------
    // go
    // -----------------------------------------------------------------------

    fn cmd_go(&mut self, rest: &[&str]) -> Vec<String> {
        let mut params = self.params.clone();
        let mut it = rest.iter();
        while let Some(&token) = it.next() {
            match token {
                "depth" => {
                    if let Some(d) = it.next().and_then(|v| v.parse().ok()) {
                        params.depth = d;
                    }
                }
                "movetime" => {
                    if let Some(ms) = it.next().and_then(|v| v.parse().ok()) {
                        params.time_limit_ms = ms;
                    }
                }
                _ => {}
            }
        }

        let mut searcher = Searcher::with_tt_size(self.evaluator.as_ref(), self.tt_size_mb);
        let mut pos = self.position.clone();
        match searcher.search_root(&mut pos, &params) {
            Some(mv) => {
                tracing::info!(
                    best = %mv,
                    score = searcher.stats.best_score,
                    depth = searcher.stats.depth,
                    nodes = searcher.stats.nodes,
                    time_ms = searcher.stats.time_ms,
                    "search finished"
                );
                vec![format!("bestmove {mv}")]
            }
            None => vec!["bestmove (none)".to_string()],
        }
    }
}

/// Split a 4-5 character UCI move token into from, to and promotion kind.
fn parse_uci_move(token: &str) -> Option<(Square, Square, Option<PieceType>)> {
    if token.len() < 4 || !token.is_ascii() {
        return None;
    }
    let from = Square::from_algebraic(&token[0..2])?;
    let to = Square::from_algebraic(&token[2..4])?;
    let promo = match token.as_bytes().get(4) {
        Some(b'q') => Some(PieceType::Queen),
        Some(b'r') => Some(PieceType::Rook),
        Some(b'b') => Some(PieceType::Bishop),
        Some(b'n') => Some(PieceType::Knight),
        _ => None,
    };
    Some((from, to, promo))
}

/// Read UCI commands from stdin until `quit`, writing replies to stdout.
pub fn run(config: &EngineConfig) -> io::Result<()> {
    let mut session = Session::new(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.split_whitespace().next() == Some("quit") {
            break;
        }
        for reply in session.handle(&line) {
            writeln!(out, "{reply}")?;
        }
        out.flush()?;
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::START_FEN;
    use crate::engine::types::Color;

    fn session() -> Session {
        Session::new(&EngineConfig::default())
    }

    #[test]
    fn uci_identifies_and_acknowledges() {
        let replies = session().handle("uci");
        assert!(replies[0].starts_with("id name castellan"));
        assert_eq!(replies.last().map(String::as_str), Some("uciok"));
    }

    #[test]
    fn isready_answers_readyok() {
        assert_eq!(session().handle("isready"), vec!["readyok"]);
    }

    #[test]
    fn ucinewgame_resets_the_board() {
        let mut s = session();
        s.handle("position startpos moves e2e4");
        s.handle("ucinewgame");
        assert_eq!(s.position().to_fen(), START_FEN);
    }

    #[test]
    fn position_startpos_with_moves() {
        let mut s = session();
        s.handle("position startpos moves e2e4 e7e5");
        assert_eq!(s.position().side_to_move, Color::White);
        assert_eq!(
            s.position().to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
    }

    #[test]
    fn position_fen_with_moves() {
        let mut s = session();
        s.handle("position fen 4k3/8/8/8/8/8/4P3/4K3 w - - 0 1 moves e2e4");
        assert_eq!(
            s.position().piece_at(Square::from_algebraic("e4").unwrap()),
            Some((Color::White, PieceType::Pawn))
        );
    }

    #[test]
    fn illegal_move_tokens_are_ignored() {
        let mut s = session();
        s.handle("position startpos moves e2e5 zz99 e2e4");
        // The two junk tokens are dropped; e2e4 still lands.
        assert_eq!(s.position().side_to_move, Color::Black);
    }

    #[test]
    fn promotion_token_matches_promotion_kind() {
        let mut s = session();
        s.handle("position fen 7k/4P3/8/8/8/8/8/4K3 w - - 0 1 moves e7e8n");
        assert_eq!(
            s.position().piece_at(Square::from_algebraic("e8").unwrap()),
            Some((Color::White, PieceType::Knight))
        );
    }

    #[test]
    fn go_depth_returns_a_legal_bestmove() {
        let mut s = session();
        s.handle("position fen k7/8/8/8/8/8/8/7K w - - 0 1");
        let replies = s.handle("go depth 1");
        assert_eq!(replies.len(), 1);
        let token = replies[0].strip_prefix("bestmove ").unwrap();
        let (from, to, _) = parse_uci_move(token).unwrap();
        let legal = legal_moves(s.position());
        assert!(legal.iter().any(|m| m.from() == from && m.to() == to));
    }

    #[test]
    fn go_on_checkmate_reports_none() {
        let mut s = session();
        s.handle("position fen rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(s.handle("go depth 2"), vec!["bestmove (none)"]);
    }

    #[test]
    fn unknown_commands_are_ignored() {
        let mut s = session();
        assert!(s.handle("xyzzy 42").is_empty());
        assert!(s.handle("").is_empty());
        assert!(s.handle("stop").is_empty());
    }

    #[test]
    fn parse_uci_move_variants() {
        assert_eq!(
            parse_uci_move("e2e4"),
            Some((Square(12), Square(28), None))
        );
        assert_eq!(
            parse_uci_move("e7e8q"),
            Some((Square(52), Square(60), Some(PieceType::Queen)))
        );
        assert_eq!(parse_uci_move("e2"), None);
        assert_eq!(parse_uci_move("z9z9"), None);
    }
}
