//! Structured logging setup.
//!
//! Pipeline code logs through `tracing` with `transaction_id` and
//! `secret_urn` fields so one request can be followed across the adapter
//! steps and the retrying transport. The embedding process calls
//! [`init_logging`] once at startup.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// The filter comes from `LOGGING_LEVEL` (falling back to `RUST_LOG`, then
/// `info`). Set `json` for machine-readable output in deployments that ship
/// logs.
pub fn init_logging(json: bool) {
    let filter = std::env::var("LOGGING_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level.to_lowercase()).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
