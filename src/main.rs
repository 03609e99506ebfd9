use castellan::config::EngineConfig;
use castellan::uci;

fn main() {
    // Structured logging on stderr — stdout belongs to the UCI protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "castellan=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(
        "castellan v{} ready (depth {}, tt {} MiB)",
        env!("CARGO_PKG_VERSION"),
        config.depth,
        config.tt_size_mb
    );

    if let Err(err) = uci::run(&config) {
        tracing::error!(%err, "I/O failure on the UCI stream");
        std::process::exit(1);
    }
}
