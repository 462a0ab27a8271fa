//! Diagnostic tracing for the binary.
//!
//! Game output goes to stdout; diagnostics go to stderr so the two never
//! interleave in a captured transcript.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output: stderr, compact format.
///
/// ```bash
/// RUST_LOG=codetrail=debug codetrail run 1 answer.txt
/// ```
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
