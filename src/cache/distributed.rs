//! Distributed cache tier contract and the in-process default provider.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;

/// A serialized cache record as stored by the distributed tier.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// JSON-encoded payload
    pub payload: Vec<u8>,
    /// Tags attached for bulk invalidation
    pub tags: Vec<String>,
}

/// The shared distributed cache tier behind the [`super::CacheService`].
///
/// Implementations back this with a store that survives across process
/// instances (Redis and friends); those providers live outside this crate.
/// [`InMemoryDistributedTier`] ships as the default for single-process
/// deployments and tests.
#[async_trait]
pub trait DistributedTier: Send + Sync {
    /// Fetch the entry under `key`, honoring its TTL.
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>>;

    /// Store `entry` under `key` for `ttl`.
    async fn set(&self, key: &str, entry: StoredEntry, ttl: Duration) -> Result<()>;

    /// Remove the entry under `key`, if any.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Every live key carrying at least one of `tags`.
    async fn keys_with_any_tag(&self, tags: &[String]) -> Result<Vec<String>>;
}

/// In-process implementation of [`DistributedTier`].
#[derive(Debug, Default)]
pub struct InMemoryDistributedTier {
    entries: DashMap<String, (StoredEntry, Instant)>,
}

impl InMemoryDistributedTier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributedTier for InMemoryDistributedTier {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>> {
        // Read and release the shard guard before any removal on the same key.
        let expired = match self.entries.get(key) {
            Some(slot) if slot.value().1 > Instant::now() => {
                return Ok(Some(slot.value().0.clone()))
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, entry: StoredEntry, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), (entry, Instant::now() + ttl));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn keys_with_any_tag(&self, tags: &[String]) -> Result<Vec<String>> {
        let wanted: HashSet<&str> = tags.iter().map(String::as_str).collect();
        let now = Instant::now();
        let keys = self
            .entries
            .iter()
            .filter(|slot| {
                slot.value().1 > now
                    && slot
                        .value()
                        .0
                        .tags
                        .iter()
                        .any(|tag| wanted.contains(tag.as_str()))
            })
            .map(|slot| slot.key().clone())
            .collect();
        Ok(keys)
    }
}
