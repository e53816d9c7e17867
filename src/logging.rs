//! # Structured Logging Module
//!
//! Environment-aware tracing initialization for the relay core. Behaviors log
//! with structured fields (`request`, `elapsed_ms`, `cache_key`); this module
//! only installs the subscriber that renders them.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with an environment-derived filter.
///
/// Reads `RUST_LOG` when set, defaulting to `info`. Safe to call more than
/// once (tests, embedders that already installed a global subscriber): the
/// second and later calls are no-ops, and an already-registered subscriber is
/// left in place.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Use try_init to avoid panicking if a global subscriber already exists
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_err()
        {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging();
        init_logging();
    }
}
