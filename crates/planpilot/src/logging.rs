//! Tracing initialization for front ends
//!
//! Library crates only emit events; subscribing happens once here.
//! `PLANPILOT_LOG` follows the usual env-filter syntax and defaults to
//! `info`.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV_VAR: &str = "PLANPILOT_LOG";

/// Install the global subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
