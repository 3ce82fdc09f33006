//! Logging setup

use crate::env::EnvSnapshot;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber.
///
/// Filter comes from `RUST_LOG` in the snapshot. Output goes to stderr so the
/// downstream process owns stdout.
pub fn init_tracing(env: &EnvSnapshot) {
    let filter = env
        .non_empty("RUST_LOG")
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
