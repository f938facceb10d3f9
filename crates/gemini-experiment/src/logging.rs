//! `tracing` subscriber for analysis runs.
//!
//! Runs report progress on stderr; stdout is reserved for the record and
//! summary tables (or the JSON report).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the stderr subscriber at `level` (trace, debug, info, warn or
/// error; anything else means info).
///
/// `RUST_LOG` wins over `level` when it parses. Only the first call in a
/// process installs a subscriber.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Filter directive for a `--log-level` value.
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Markers that open run-level log lines.
pub mod prefix {
    /// A trial begins
    pub const TRIAL: &str = "꩜";
    /// The CLI starts an analysis
    pub const START: &str = "✿";
    /// The run finished or stopped on cancellation
    pub const DONE: &str = "❀";
    /// Datasets are standardized
    pub const DATA: &str = "⊔";
}
