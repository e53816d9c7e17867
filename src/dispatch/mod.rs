//! # Dispatcher
//!
//! Routes each request value to the single pipeline registered for its type.
//! Registration fixes the behavior chain per request type (Validation →
//! Caching for cacheable requests → Logging → Handler); dispatch locates the
//! pipeline by `TypeId` and runs it.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::config::PipelineConfig;
use crate::outcome::{make_failure, AppError, ResultType};
use crate::pipeline::{
    Behavior, CachingBehavior, CancelSignal, Handler, LoggingBehavior, Pipeline,
    ValidationBehavior, Validator,
};
use crate::request::{CacheableRequest, Request};

/// Registry of request pipelines, one per request type.
///
/// Exactly one handler serves each request type; registering a second
/// replaces the first with a warning. Unknown request types dispatch to a
/// failed response rather than panicking.
pub struct Dispatcher {
    cache: Arc<CacheService>,
    pipelines: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    config: PipelineConfig,
}

impl Dispatcher {
    pub fn new(cache: Arc<CacheService>, config: PipelineConfig) -> Self {
        Self {
            cache,
            pipelines: DashMap::new(),
            config,
        }
    }

    /// Register the handler (and validators) for a non-cacheable request
    /// type. The chain is Validation → Logging → Handler.
    pub fn register<R>(
        &self,
        handler: Arc<dyn Handler<R, R::Response>>,
        validators: Vec<Arc<dyn Validator<R>>>,
    ) where
        R: Request,
        R::Response: ResultType + Send + 'static,
    {
        let behaviors: Vec<Arc<dyn Behavior<R, R::Response>>> = vec![
            Arc::new(ValidationBehavior::new(validators)),
            Arc::new(LoggingBehavior::new(self.config.slow_request_threshold())),
        ];
        self.install::<R>(Pipeline::new(behaviors, handler));
    }

    /// Register the handler (and validators) for a cacheable request type.
    /// The chain is Validation → Caching → Logging → Handler.
    pub fn register_cacheable<R>(
        &self,
        handler: Arc<dyn Handler<R, R::Response>>,
        validators: Vec<Arc<dyn Validator<R>>>,
    ) where
        R: CacheableRequest,
        R::Response: ResultType + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let behaviors: Vec<Arc<dyn Behavior<R, R::Response>>> = vec![
            Arc::new(ValidationBehavior::new(validators)),
            Arc::new(CachingBehavior::new(Arc::clone(&self.cache))),
            Arc::new(LoggingBehavior::new(self.config.slow_request_threshold())),
        ];
        self.install::<R>(Pipeline::new(behaviors, handler));
    }

    /// Dispatch a request through its registered pipeline.
    pub async fn send<R>(&self, request: R, cancel: CancelSignal) -> R::Response
    where
        R: Request,
        R::Response: ResultType,
    {
        let erased = match self.pipelines.get(&TypeId::of::<R>()) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                warn!(request = R::name(), "no handler registered");
                return make_failure(vec![AppError::with_metadata(
                    format!("no handler registered for {}", R::name()),
                    [("kind", "dispatch")],
                )]);
            }
        };

        match erased.downcast::<Pipeline<R, R::Response>>() {
            Ok(pipeline) => pipeline.dispatch(request, cancel).await,
            Err(_) => make_failure(vec![AppError::with_metadata(
                format!("mismatched pipeline registered for {}", R::name()),
                [("kind", "dispatch")],
            )]),
        }
    }

    /// The cache service behind the caching behavior.
    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    fn install<R>(&self, pipeline: Pipeline<R, R::Response>)
    where
        R: Request,
        R::Response: Send + 'static,
    {
        let replaced = self
            .pipelines
            .insert(TypeId::of::<R>(), Arc::new(pipeline))
            .is_some();
        if replaced {
            warn!(request = R::name(), "handler registration replaced");
        } else {
            info!(request = R::name(), "handler registered");
        }
    }
}
