//! # Relay Core
//!
//! A request-processing core for service backends: every inbound command or
//! query is a typed request that flows through a fixed chain of cross-cutting
//! behaviors (validation, caching, logging) before reaching its handler, and
//! every handler outcome is an explicit success/failure value rather than a
//! propagated panic or error type.
//!
//! ## Module Organization
//!
//! - [`outcome`] - The success/failure algebra ([`Outcome`], [`TypedOutcome`],
//!   [`AppError`]) used by every handler and behavior
//! - [`request`] - Typed request taxonomy and cache-policy metadata
//! - [`pipeline`] - The behavior chain wrapped around handler invocation
//! - [`dispatch`] - Per-request-type pipeline registry and entry point
//! - [`cache`] - Two-tier, tag-indexed cache with single-flight population
//! - [`domain`] - Pending domain-event recording and publishing
//! - [`config`] - Cache and pipeline configuration
//! - [`logging`] - Tracing subscriber initialization
//! - [`error`] - Infrastructure error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use relay_core::cache::CacheService;
//! use relay_core::config::RelayConfig;
//! use relay_core::dispatch::Dispatcher;
//! use relay_core::outcome::TypedOutcome;
//! use relay_core::pipeline::{CancelSignal, Handler};
//! use relay_core::request::{Query, Request, RequestKind};
//!
//! #[derive(Debug)]
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = TypedOutcome<String>;
//!     fn kind() -> RequestKind {
//!         RequestKind::Query
//!     }
//! }
//! impl Query for Ping {}
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl Handler<Ping, TypedOutcome<String>> for PingHandler {
//!     async fn handle(&self, _request: Arc<Ping>, _cancel: CancelSignal) -> TypedOutcome<String> {
//!         TypedOutcome::from_value("pong".to_string())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = RelayConfig::default();
//! let cache = Arc::new(CacheService::new(config.cache));
//! let dispatcher = Dispatcher::new(cache, config.pipeline);
//! dispatcher.register::<Ping>(Arc::new(PingHandler), Vec::new());
//!
//! let response = dispatcher.send(Ping, CancelSignal::none()).await;
//! assert_eq!(response.value(), "pong");
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod logging;
pub mod outcome;
pub mod pipeline;
pub mod request;

pub use cache::CacheService;
pub use config::RelayConfig;
pub use dispatch::Dispatcher;
pub use error::{RelayError, Result};
pub use outcome::{AppError, Outcome, ResultType, TypedOutcome};
pub use pipeline::{CancelHandle, CancelSignal, Handler};
pub use request::{CachePolicy, CacheableRequest, Request, RequestKind};
