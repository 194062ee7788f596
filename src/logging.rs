//! Logging configuration for querygate.
//!
//! Logs go to stderr so that stdout carries only query output.

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset or invalid.
const DEFAULT_DIRECTIVE: &str = "info";

/// Initializes logging to stderr.
///
/// Verbosity follows `RUST_LOG`, defaulting to `info`.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
        )
        .with_writer(std::io::stderr)
        .init();
}
