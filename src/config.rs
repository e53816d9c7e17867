//! Configuration Management
//!
//! Serde-backed configuration for the cache tiers and the behavior pipeline,
//! with production defaults and environment-variable overrides. Different
//! environments (production, development, test) tune TTLs through
//! `RELAY_`-prefixed variables, e.g. `RELAY_CACHE__LOCAL_TTL_SECONDS=10`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration for the relay core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Configuration for the two-tier cache service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL for the process-local tier, in seconds
    pub local_ttl_seconds: u64,
    /// Default TTL for the shared distributed tier, in seconds
    pub distributed_ttl_seconds: u64,
    /// Recommended (not enforced) prefix for caller-constructed cache keys
    pub default_prefix: String,
}

impl CacheConfig {
    /// Local-tier default TTL as a `Duration`
    pub fn local_ttl(&self) -> Duration {
        Duration::from_secs(self.local_ttl_seconds)
    }

    /// Distributed-tier default TTL as a `Duration`
    pub fn distributed_ttl(&self) -> Duration {
        Duration::from_secs(self.distributed_ttl_seconds)
    }

    /// Test-optimized configuration with rapid expiry
    pub fn for_test() -> Self {
        Self {
            local_ttl_seconds: 1,
            distributed_ttl_seconds: 2,
            default_prefix: "test_".to_string(),
        }
    }
}

impl Default for CacheConfig {
    /// Defaults suitable for production: 5 minute local tier, 30 minute
    /// distributed tier.
    fn default() -> Self {
        Self {
            local_ttl_seconds: 300,
            distributed_ttl_seconds: 1800,
            default_prefix: "ch_".to_string(),
        }
    }
}

/// Configuration for the behavior pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Requests slower than this are logged at `warn` severity, in seconds
    pub slow_request_threshold_seconds: u64,
}

impl PipelineConfig {
    /// Slow-request threshold as a `Duration`
    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_secs(self.slow_request_threshold_seconds)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slow_request_threshold_seconds: 3,
        }
    }
}

impl RelayConfig {
    /// Load configuration from defaults overlaid with `RELAY_`-prefixed
    /// environment variables (`__` separates nesting levels).
    pub fn load() -> Result<Self> {
        let defaults = config::Config::try_from(&RelayConfig::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::Environment::with_prefix("RELAY").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
