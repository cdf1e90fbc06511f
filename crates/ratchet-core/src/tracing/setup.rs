//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding per-target log directives.
pub const LOG_ENV_VAR: &str = "RATCHET_LOG";

/// Initialize the tracing/logging system.
///
/// Reads `RATCHET_LOG` for per-subsystem levels, e.g.
/// `RATCHET_LOG=ratchet_analysis::history=debug,ratchet_storage=warn`.
/// Falls back to `ratchet=info` when unset or invalid.
///
/// Idempotent; only the first call installs a subscriber.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("ratchet=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
