//! # Cache Service
//!
//! Two-tier (process-local + shared distributed) key/value store with
//! tag-based bulk invalidation and single-flight population. The caching
//! behavior drives it for request responses; it is also usable directly.
//!
//! Keys are caller-constructed strings; uniqueness and collision-avoidance
//! are the caller's responsibility (see
//! [`crate::request::CachePolicy::DEFAULT_PREFIX`]).

mod distributed;
mod service;

pub use distributed::{DistributedTier, InMemoryDistributedTier, StoredEntry};
pub use service::CacheService;
