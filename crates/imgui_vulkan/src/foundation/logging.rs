//! Logging setup for the backend and its demo applications
//!
//! All diagnostics go through the `log` facade; applications pick the
//! sink. These helpers configure `env_logger` the way the demo expects.

pub use log::{debug, error, info, trace, warn};

/// Initialize logging from the `RUST_LOG` environment variable
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a fallback filter when `RUST_LOG` is unset
///
/// Useful for demo binaries that should print something sensible out of
/// the box, e.g. `init_with_default_filter("info")`.
pub fn init_with_default_filter(filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}
