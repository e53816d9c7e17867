//! Infrastructure error types for the relay core.
//!
//! These cover faults in the plumbing: cache tiers, serialization,
//! configuration loading, and dispatch routing. Domain-level failures travel
//! through the [`crate::outcome`] algebra instead and never through this enum.

/// Errors raised by the relay infrastructure itself.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A cache tier failed to read or write an entry
    #[error("Cache error: {0}")]
    Cache(String),

    /// A cached payload could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    /// A request could not be routed to a handler
    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

/// Convenience alias used throughout the crate for infrastructure results.
pub type Result<T> = std::result::Result<T, RelayError>;
