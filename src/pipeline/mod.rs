//! # Behavior Pipeline
//!
//! A fixed, ordered chain of cross-cutting behaviors wrapped around handler
//! invocation. The order (outer to inner) is Validation → Caching → Logging →
//! Handler: validation short-circuits before any cache traffic or timing,
//! caching wraps logging so cache hits are still timed and logged, and
//! logging sits innermost so it measures handler latency specifically.
//!
//! The chain is composed once at construction by folding an explicit behavior
//! list around the terminal handler; execution is strict call/return nesting
//! (the Nth behavior entered is the Nth-from-last to exit).

mod cancel;
mod caching;
mod logging;
mod validation;

pub use cancel::{CancelHandle, CancelSignal};
pub use caching::CachingBehavior;
pub use logging::LoggingBehavior;
pub use validation::{FieldFailure, Severity, ValidationBehavior, Validator};

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

/// The continuation a behavior invokes to run the rest of the chain.
pub type Next<Req, Resp> =
    Arc<dyn Fn(Arc<Req>, CancelSignal) -> BoxFuture<'static, Resp> + Send + Sync>;

/// A pipeline interceptor wrapping handler invocation with one cross-cutting
/// concern. Behaviors either delegate to `next` or short-circuit with a
/// response of their own; they must check `cancel` at every suspension point.
#[async_trait]
pub trait Behavior<Req, Resp>: Send + Sync
where
    Req: Send + Sync + 'static,
    Resp: Send + 'static,
{
    async fn handle(&self, request: Arc<Req>, next: Next<Req, Resp>, cancel: CancelSignal)
        -> Resp;
}

/// The terminal handler a pipeline wraps. Exactly one handler serves each
/// request type.
#[async_trait]
pub trait Handler<Req, Resp>: Send + Sync
where
    Req: Send + Sync + 'static,
    Resp: Send + 'static,
{
    async fn handle(&self, request: Arc<Req>, cancel: CancelSignal) -> Resp;
}

/// An ordered behavior chain folded around a terminal handler into a single
/// callable. Construction fixes the order; dispatch reuses the composed chain
/// for every request of the type.
pub struct Pipeline<Req, Resp> {
    chain: Next<Req, Resp>,
}

impl<Req, Resp> Pipeline<Req, Resp>
where
    Req: Send + Sync + 'static,
    Resp: Send + 'static,
{
    /// Compose `behaviors` (outermost first) around `handler`.
    pub fn new(
        behaviors: Vec<Arc<dyn Behavior<Req, Resp>>>,
        handler: Arc<dyn Handler<Req, Resp>>,
    ) -> Self {
        let terminal: Next<Req, Resp> = Arc::new(move |request, cancel| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler.handle(request, cancel).await })
        });

        let chain = behaviors
            .into_iter()
            .rev()
            .fold(terminal, |inner, behavior| {
                let wrapped: Next<Req, Resp> = Arc::new(move |request, cancel| {
                    let behavior = Arc::clone(&behavior);
                    let inner = Arc::clone(&inner);
                    Box::pin(async move { behavior.handle(request, inner, cancel).await })
                });
                wrapped
            });

        Self { chain }
    }

    /// Run the composed chain for one request.
    pub async fn dispatch(&self, request: Req, cancel: CancelSignal) -> Resp {
        (self.chain)(Arc::new(request), cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;
    use parking_lot::Mutex;

    struct Probe {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Behavior<u32, Outcome> for Probe {
        async fn handle(
            &self,
            request: Arc<u32>,
            next: Next<u32, Outcome>,
            cancel: CancelSignal,
        ) -> Outcome {
            self.log.lock().push(format!("enter {}", self.label));
            let response = next(request, cancel).await;
            self.log.lock().push(format!("exit {}", self.label));
            response
        }
    }

    struct UnitHandler {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Handler<u32, Outcome> for UnitHandler {
        async fn handle(&self, _request: Arc<u32>, _cancel: CancelSignal) -> Outcome {
            self.log.lock().push("handler".to_string());
            Outcome::ok()
        }
    }

    #[tokio::test]
    async fn behaviors_nest_in_lifo_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let behaviors: Vec<Arc<dyn Behavior<u32, Outcome>>> = vec![
            Arc::new(Probe {
                label: "outer",
                log: log.clone(),
            }),
            Arc::new(Probe {
                label: "inner",
                log: log.clone(),
            }),
        ];
        let pipeline = Pipeline::new(behaviors, Arc::new(UnitHandler { log: log.clone() }));

        let outcome = pipeline.dispatch(1, CancelSignal::none()).await;
        assert!(outcome.is_success());
        assert_eq!(
            *log.lock(),
            vec!["enter outer", "enter inner", "handler", "exit inner", "exit outer"]
        );
    }

    #[tokio::test]
    async fn empty_behavior_list_still_reaches_the_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Vec::new(), Arc::new(UnitHandler { log: log.clone() }));
        let outcome = pipeline.dispatch(1, CancelSignal::none()).await;
        assert!(outcome.is_success());
        assert_eq!(*log.lock(), vec!["handler"]);
    }
}
