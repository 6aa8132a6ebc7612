//! Diagnostic logging setup.
//!
//! Logs go to stderr so streamed replies on stdout stay clean. The filter is
//! read from `DEEPCHAT_LOG`, then `RUST_LOG`, and defaults to warnings only.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "DEEPCHAT_LOG";
const DEFAULT_FILTER: &str = "warn";

pub fn build_filter(explicit: Option<&str>) -> EnvFilter {
    explicit
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| {
            std::env::var(LOG_ENV_VAR)
                .ok()
                .and_then(|value| EnvFilter::try_new(value).ok())
        })
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Calling this twice is harmless.
pub fn init_tracing(explicit: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(explicit))
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();
}
