//! Two-tier cache service with tag indexing and single-flight population.

use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::distributed::{DistributedTier, InMemoryDistributedTier, StoredEntry};
use crate::config::CacheConfig;
use crate::error::Result;

/// An entry in the process-local tier. Values are stored type-erased and
/// cloned out on read; callers never see internal references.
struct LocalEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
    tags: Vec<String>,
}

/// Two-tier key/value cache: a low-latency process-local tier backed by a
/// shared distributed tier, with tag-based bulk invalidation and
/// single-flight population.
///
/// Reads check the local tier first; a local miss falls through to the
/// distributed tier and repopulates the local tier on a hit. All mutation is
/// safe under concurrent access from multiple requests; the per-key flight
/// lock in [`CacheService::get_or_create`] is the only synchronization
/// callers ever wait on.
pub struct CacheService {
    local: DashMap<String, LocalEntry>,
    distributed: Arc<dyn DistributedTier>,
    tag_index: DashMap<String, HashSet<String>>,
    flights: DashMap<String, Arc<Mutex<()>>>,
    config: CacheConfig,
}

impl CacheService {
    /// A cache service backed by the in-process distributed tier.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_tier(config, Arc::new(InMemoryDistributedTier::new()))
    }

    /// A cache service backed by the given distributed tier provider.
    pub fn with_tier(config: CacheConfig, distributed: Arc<dyn DistributedTier>) -> Self {
        Self {
            local: DashMap::new(),
            distributed,
            tag_index: DashMap::new(),
            flights: DashMap::new(),
            config,
        }
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read the value under `key`, checking the local tier first and falling
    /// back to the distributed tier (repopulating the local tier on a hit).
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let local_hit = match self.local.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                entry.value.downcast_ref::<T>().cloned()
            }
            _ => None,
        };
        if let Some(value) = local_hit {
            return Ok(Some(value));
        }
        if let Some((_, entry)) = self
            .local
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now())
        {
            self.unindex(key, &entry.tags);
        }

        let Some(stored) = self.distributed.get(key).await? else {
            return Ok(None);
        };
        let value: T = serde_json::from_slice(&stored.payload)?;
        self.insert_local(key, Arc::new(value.clone()), &stored.tags, None);
        debug!(key, "local tier repopulated from distributed tier");
        Ok(Some(value))
    }

    /// Read the value under `key`, or produce it with `factory` and store it.
    ///
    /// Single-flight: concurrent calls that all miss on the same key invoke
    /// `factory` exactly once; every caller receives the produced value.
    pub async fn get_or_create<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        tags: &[String],
        local_ttl: Option<Duration>,
        distributed_ttl: Option<Duration>,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let flight = self
            .flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = flight.lock().await;

        let result: Result<T> = async {
            // Lost the race: the flight winner populated the key while we
            // waited.
            if let Some(value) = self.get(key).await? {
                return Ok(value);
            }
            let value = factory().await;
            self.set(key, value.clone(), tags, local_ttl, distributed_ttl)
                .await?;
            Ok(value)
        }
        .await;

        // The flight entry must not outlive the flight, whether it produced a
        // value, lost the race, or failed to store.
        drop(guard);
        self.flights.remove(key);
        result
    }

    /// Store `value` under `key` in both tiers with the given tags, using the
    /// configured default TTLs where overrides are `None`.
    pub async fn set<T>(
        &self,
        key: &str,
        value: T,
        tags: &[String],
        local_ttl: Option<Duration>,
        distributed_ttl: Option<Duration>,
    ) -> Result<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let payload = serde_json::to_vec(&value)?;
        self.insert_local(key, Arc::new(value), tags, local_ttl);
        self.distributed
            .set(
                key,
                StoredEntry {
                    payload,
                    tags: tags.to_vec(),
                },
                distributed_ttl.unwrap_or(self.config.distributed_ttl()),
            )
            .await
    }

    /// Whether a live entry exists under `key` in either tier.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let local_live = self
            .local
            .get(key)
            .map(|entry| entry.expires_at > Instant::now())
            .unwrap_or(false);
        if local_live {
            return Ok(true);
        }
        Ok(self.distributed.get(key).await?.is_some())
    }

    /// Remove the entry under `key` from both tiers.
    pub async fn remove(&self, key: &str) -> Result<()> {
        if let Some((_, entry)) = self.local.remove(key) {
            self.unindex(key, &entry.tags);
        }
        self.distributed.remove(key).await
    }

    /// Remove every entry carrying any of `tags`, across both tiers. A
    /// subsequent read for any affected key misses.
    pub async fn remove_by_tags(&self, tags: &[String]) -> Result<()> {
        let mut keys: HashSet<String> = HashSet::new();
        for tag in tags {
            if let Some((_, tagged)) = self.tag_index.remove(tag) {
                keys.extend(tagged);
            }
        }
        keys.extend(self.distributed.keys_with_any_tag(tags).await?);

        debug!(tags = ?tags, affected = keys.len(), "removing cache entries by tag");
        for key in keys {
            self.remove(&key).await?;
        }
        Ok(())
    }

    fn insert_local(
        &self,
        key: &str,
        value: Arc<dyn Any + Send + Sync>,
        tags: &[String],
        local_ttl: Option<Duration>,
    ) {
        self.local.insert(
            key.to_string(),
            LocalEntry {
                value,
                expires_at: Instant::now() + local_ttl.unwrap_or(self.config.local_ttl()),
                tags: tags.to_vec(),
            },
        );
        for tag in tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn unindex(&self, key: &str, tags: &[String]) {
        for tag in tags {
            // Release the entry guard before removing the emptied set; both
            // touch the same shard.
            let emptied = match self.tag_index.get_mut(tag) {
                Some(mut tagged) => {
                    tagged.remove(key);
                    tagged.is_empty()
                }
                None => false,
            };
            if emptied {
                self.tag_index.remove_if(tag, |_, tagged| tagged.is_empty());
            }
        }
    }
}
