//! Log subscriber installation.
//!
//! Logs go to standard error so command outcomes on standard output stay
//! machine-readable. The filter is read from `WFVERIFY_LOG` using
//! `EnvFilter` directive syntax and defaults to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "WFVERIFY_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber, as JSON lines when `json` is set.
///
/// Returns `false` if a global subscriber was already installed; the
/// existing one is left in place.
#[must_use]
pub fn init(json: bool) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter());
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.is_ok()
}
