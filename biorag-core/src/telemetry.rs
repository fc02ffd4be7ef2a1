//! Tracing setup shared by all three CLI binaries.

use tracing_subscriber::EnvFilter;

/// Initialize a global `tracing` subscriber reading `RUST_LOG`
/// (default `info`), with human-readable formatting and ANSI colour when
/// stdout is a terminal.
///
/// Safe to call more than once per process (subsequent calls are no-ops);
/// this matters for tests that spin up multiple components in-process.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
