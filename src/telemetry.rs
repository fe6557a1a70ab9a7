//! Telemetry logic.
//! Structured logging to stdout, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();
}
