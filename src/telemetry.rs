//! Telemetry initialization.
//!
//! Controlled by `QUARRY_LOG_FORMAT`:
//! - unset or `"text"` → human-readable output to stderr
//! - `"json"` → JSON events to stderr (for harness log collection)
//!
//! Filtering uses the standard `RUST_LOG` env-filter syntax, defaulting to
//! `info`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Call once from `main`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("QUARRY_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
