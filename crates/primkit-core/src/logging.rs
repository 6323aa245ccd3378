#![forbid(unsafe_code)]

//! Logging targets and tracing re-exports.
//!
//! All primkit crates log through `tracing` under a small set of targets so
//! hosts can filter per subsystem, e.g. `RUST_LOG=primkit::layout=debug`.

pub use tracing::{debug, debug_span, error, info, trace, trace_span, warn};

/// Measure/arrange passes and panel algorithms.
pub const LAYOUT: &str = "primkit::layout";

/// Pointer capture and interactive state machines.
pub const INPUT: &str = "primkit::input";

/// Item-container generation.
pub const GENERATOR: &str = "primkit::generator";

/// Rejected configuration values.
pub const CONFIG: &str = "primkit::config";

/// Install a JSON subscriber filtered by `filter` (env-filter syntax).
///
/// Returns an error if a global subscriber is already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json(filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .try_init()
}
