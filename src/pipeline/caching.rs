//! Caching behavior: invalidate, read, bypass, hit, or populate.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::cancel::{cancellation_failure, CancelSignal};
use super::{Behavior, Next};
use crate::cache::CacheService;
use crate::outcome::ResultType;
use crate::request::{CacheableRequest, Request};

/// Serves cacheable requests from the two-tier cache, populating it from the
/// inner chain on a miss.
///
/// Resolution order per request: an `invalidate` policy removes the entry and
/// always continues inward without re-storing, so the key stays absent after
/// a write; `bypass` always runs the inner chain, winning over a hit but not
/// over invalidation bookkeeping already performed; a hit returns the cached
/// response without invoking the inner chain; a miss runs the inner chain and
/// stores the entire response, failures included, under the request's TTLs.
///
/// Cache infrastructure faults never fail the request: a broken read degrades
/// to a miss, a broken write is logged and skipped.
pub struct CachingBehavior {
    cache: Arc<CacheService>,
}

impl CachingBehavior {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<Req, Resp> Behavior<Req, Resp> for CachingBehavior
where
    Req: CacheableRequest<Response = Resp>,
    Resp: ResultType + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn handle(
        &self,
        request: Arc<Req>,
        next: Next<Req, Resp>,
        cancel: CancelSignal,
    ) -> Resp {
        if cancel.is_cancelled() {
            return cancellation_failure();
        }

        let policy = request.cache_policy();
        let mut cached: Option<Resp> = None;

        if policy.invalidate {
            match self.cache.remove(&policy.cache_key).await {
                Ok(()) => debug!(key = %policy.cache_key, "cache entry invalidated"),
                Err(error) => {
                    warn!(key = %policy.cache_key, %error, "cache invalidation failed");
                }
            }
        } else {
            match self.cache.get::<Resp>(&policy.cache_key).await {
                Ok(hit) => cached = hit,
                Err(error) => {
                    warn!(key = %policy.cache_key, %error, "cache read failed; treating as miss");
                }
            }
        }

        if cancel.is_cancelled() {
            return cancellation_failure();
        }

        if policy.bypass {
            return next(request, cancel).await;
        }

        if let Some(response) = cached {
            debug!(request = Req::name(), key = %policy.cache_key, "cache hit");
            return response;
        }

        let response = next(Arc::clone(&request), cancel.clone()).await;

        if policy.invalidate || cancel.is_cancelled() {
            return response;
        }
        match self
            .cache
            .set(
                &policy.cache_key,
                response.clone(),
                &[],
                policy.local_ttl,
                policy.distributed_ttl,
            )
            .await
        {
            Ok(()) => debug!(request = Req::name(), key = %policy.cache_key, "response cached"),
            Err(error) => warn!(key = %policy.cache_key, %error, "cache write failed"),
        }

        response
    }
}
