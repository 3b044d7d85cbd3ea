//! Logging setup for the highcalc binaries.

use std::io::IsTerminal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter: keep the engine quiet unless something is off
pub const DEFAULT_LEVEL: &str = "warn";

/// Initialize logging with the default level
pub fn init() {
    init_with_level(DEFAULT_LEVEL)
}

/// Initialize logging with a specific default level
///
/// `RUST_LOG` still overrides `default_level` when set. Logs go to stderr
/// so they never mix with rendered reports on stdout.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Initialize logging for tests (captured per test)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
