//! # Request Taxonomy
//!
//! Typed markers distinguishing the four request categories (domain, command,
//! query, external) that share one dispatch contract: a request declares its
//! response type and is routed to exactly one handler. The cacheable
//! extension carries the cache-policy fields the caching behavior consumes.

use std::time::Duration;

/// The four request categories. They distinguish intent, not dispatch: every
/// kind is routed the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// A fact raised inside the domain model
    Domain,
    /// An instruction to change state
    Command,
    /// A read with no side effects
    Query,
    /// An integration event from outside the service
    External,
}

/// A dispatchable request. Each implementor declares the response type its
/// single handler returns.
pub trait Request: Send + Sync + 'static {
    /// The response type produced by this request's handler.
    type Response: Send + 'static;

    /// Which category this request belongs to.
    fn kind() -> RequestKind;

    /// Human-readable request name for logs. Defaults to the type name.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Marker for state-changing requests.
pub trait Command: Request {}

/// Marker for side-effect-free read requests.
pub trait Query: Request {}

/// A command or query that participates in the caching behavior. Non-cacheable
/// requests skip that behavior entirely; the distinction is capability, not
/// concrete type.
pub trait CacheableRequest: Request {
    /// The cache policy for this request instance. Constructed once per
    /// inbound request and read-only thereafter.
    fn cache_policy(&self) -> CachePolicy;
}

/// Cache-policy metadata carried by a [`CacheableRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Full cache key; uniqueness is the caller's responsibility
    pub cache_key: String,
    /// Prefix the key was built with (advisory, not enforced)
    pub cache_prefix: String,
    /// Remove the entry before running the rest of the chain (write paths)
    pub invalidate: bool,
    /// Always run the inner chain, ignoring any cached value
    pub bypass: bool,
    /// Local-tier TTL override; service default when `None`
    pub local_ttl: Option<Duration>,
    /// Distributed-tier TTL override; service default when `None`
    pub distributed_ttl: Option<Duration>,
}

impl CachePolicy {
    /// Recommended default key prefix. Advisory only.
    pub const DEFAULT_PREFIX: &'static str = "ch_";

    /// A policy for `key` with no prefix, defaults everywhere else.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            cache_key: key.into(),
            cache_prefix: String::new(),
            invalidate: false,
            bypass: false,
            local_ttl: None,
            distributed_ttl: None,
        }
    }

    /// A policy whose key is `prefix` + `key`.
    pub fn prefixed(prefix: impl Into<String>, key: impl AsRef<str>) -> Self {
        let prefix = prefix.into();
        let cache_key = format!("{}{}", prefix, key.as_ref());
        Self {
            cache_prefix: prefix,
            ..Self::new(cache_key)
        }
    }

    /// Mark this request as invalidating its cache entry.
    pub fn invalidating(mut self) -> Self {
        self.invalidate = true;
        self
    }

    /// Mark this request as bypassing the cache.
    pub fn bypassing(mut self) -> Self {
        self.bypass = true;
        self
    }

    /// Override the local-tier TTL.
    pub fn with_local_ttl(mut self, ttl: Duration) -> Self {
        self.local_ttl = Some(ttl);
        self
    }

    /// Override the distributed-tier TTL.
    pub fn with_distributed_ttl(mut self, ttl: Duration) -> Self {
        self.distributed_ttl = Some(ttl);
        self
    }
}
