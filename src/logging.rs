//! Logging setup and scoped operation timing.

use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `debug` with `debug`
/// enabled and `info` without. Calling this twice is harmless.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Runs `op`, logging when the named operation starts and how long it took.
pub fn timed<T>(name: &str, op: impl FnOnce() -> T) -> T {
    info!(operation = name, "started");
    let start = Instant::now();
    let out = op();
    info!(
        operation = name,
        "finished in {:.3}s",
        start.elapsed().as_secs_f64()
    );
    out
}
