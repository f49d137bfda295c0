//! crates/logging/src/tracing_bridge.rs
//! Subscriber initialisation for the verbosity system.
//!
//! The subscriber is a `tracing-subscriber` fmt layer writing to stderr,
//! filtered by an [`EnvFilter`] built from [`VerbosityConfig`]. When the
//! override variable (default [`LOG_ENV`]) is set, its directives are appended
//! after the configured ones so they win for overlapping targets.

use super::config::VerbosityConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable consulted for extra filter directives.
pub const LOG_ENV: &str = "METARESTORE_LOG";

/// Builds the filter for `config`, merged with `override_directives`.
///
/// Invalid override directives are ignored rather than aborting startup.
#[must_use]
pub fn build_filter(config: &VerbosityConfig, override_directives: Option<&str>) -> EnvFilter {
    let mut directives = config.filter_directives();
    if let Some(extra) = override_directives.map(str::trim).filter(|extra| !extra.is_empty()) {
        let candidate = format!("{directives},{extra}");
        if EnvFilter::try_new(&candidate).is_ok() {
            directives = candidate;
        }
    }
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialise tracing with `config`, honouring [`LOG_ENV`].
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when a host application or a previous test set one up.
pub fn init_tracing(config: &VerbosityConfig) -> bool {
    let extra = std::env::var(LOG_ENV).ok();
    init_tracing_with_filter(build_filter(config, extra.as_deref()))
}

/// Initialise tracing with an explicit filter.
pub fn init_tracing_with_filter(filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .is_ok()
}
