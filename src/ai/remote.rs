//! Remote evaluation over HTTP.
//!
//! A drop-in [`Evaluate`] implementation that asks an external scoring
//! service for its verdict instead of using the built-in terms. Scores are
//! memoised by Zobrist key for the lifetime of the process, so each distinct
//! position costs at most one round trip. Transport and decoding failures
//! degrade to a score of 0 — the engine keeps playing, just blandly.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::evaluation::Evaluate;
use crate::engine::board::Position;

/// Where the scorer listens when no URL is configured.
pub const DEFAULT_EVAL_URL: &str = "http://127.0.0.1:8000/evaluate";

#[derive(Serialize)]
struct EvalRequest<'a> {
    fen: &'a str,
}

#[derive(Deserialize)]
struct EvalResponse {
    score: i32,
}

/// HTTP-backed evaluator with a process-lifetime score cache.
///
/// The client is blocking on purpose: the search is strictly single-threaded
/// and a cache miss is a synchronous pause in it. The cache sits behind a
/// mutex so the type stays shareable.
pub struct RemoteEvaluator {
    url: String,
    client: reqwest::blocking::Client,
    cache: Mutex<HashMap<u64, i32>>,
}

impl RemoteEvaluator {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteEvaluator {
            url: url.into(),
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drop all memoised scores.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Number of memoised scores.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<u64, i32>> {
        self.cache.lock().expect("evaluation cache mutex poisoned")
    }

    /// One round trip to the scorer. `None` on any transport or decode
    /// failure; the caller turns that into a neutral score.
    fn request_score(&self, fen: &str) -> Option<i32> {
        let response = self
            .client
            .post(&self.url)
            .json(&EvalRequest { fen })
            .send()
            .inspect_err(|err| tracing::warn!(%err, "evaluation request failed"))
            .ok()?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "evaluation service returned an error");
            return None;
        }

        response
            .json::<EvalResponse>()
            .inspect_err(|err| tracing::warn!(%err, "evaluation response did not parse"))
            .ok()
            .map(|body| body.score)
    }
}

impl Default for RemoteEvaluator {
    fn default() -> Self {
        RemoteEvaluator::new(DEFAULT_EVAL_URL)
    }
}

impl Evaluate for RemoteEvaluator {
    fn evaluate(&self, pos: &Position) -> i32 {
        let hash = pos.zobrist_hash;

        if let Some(&score) = self.lock_cache().get(&hash) {
            return score;
        }

        let fen = pos.to_fen();
        let score = self.request_score(&fen).unwrap_or(0);

        self.lock_cache().insert(hash, score);
        score
    }

    fn name(&self) -> &str {
        "remote"
    }
}

// =========================================================================
// Tests
// =========================================================================
