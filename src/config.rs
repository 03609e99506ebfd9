/// Engine configuration parsed from environment variables.
///
/// Nothing here is required: the engine runs on defaults alone, and a UCI
/// `go` command can still override depth and movetime per search.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default search depth when `go` gives none.
    pub depth: u32,
    /// Transposition-table budget in MiB.
    pub tt_size_mb: usize,
    /// Default movetime in milliseconds; 0 disables the time limit.
    pub movetime_ms: u64,
    /// URL of the remote evaluation service; unset means the built-in
    /// static evaluator.
    pub eval_url: Option<String>,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        EngineConfig {
            depth: std::env::var("CASTELLAN_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
            tt_size_mb: std::env::var("CASTELLAN_TT_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(16),
            movetime_ms: std::env::var("CASTELLAN_MOVETIME_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            eval_url: std::env::var("CASTELLAN_EVAL_URL").ok(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            depth: 6,
            tt_size_mb: 16,
            movetime_ms: 0,
            eval_url: None,
        }
    }
}
