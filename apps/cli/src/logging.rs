//! Logging setup for the server.
//!
//! Filter directives come from `FOLIO_LOG` (for example
//! `FOLIO_LOG=folio_app=debug,info`); unset or invalid means `info`.

use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "FOLIO_LOG";

/// Installs the global subscriber. Call once, at startup.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
