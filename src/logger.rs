//! Logging utilities.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global logger. Honours `RUST_LOG`, defaulting to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
