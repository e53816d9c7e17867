//! Logging behavior: request/response names and handler latency.

use std::any::type_name;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use super::cancel::{cancellation_failure, CancelSignal};
use super::{Behavior, Next};
use crate::outcome::ResultType;
use crate::request::Request;

/// Logs request and response type names, measures elapsed wall time around
/// the inner chain, and logs at `warn` above the slow threshold. Never alters
/// the response.
pub struct LoggingBehavior {
    slow_threshold: Duration,
}

impl LoggingBehavior {
    /// Calls slower than this are classified as slow.
    pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(3);

    pub fn new(slow_threshold: Duration) -> Self {
        Self { slow_threshold }
    }
}

impl Default for LoggingBehavior {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SLOW_THRESHOLD)
    }
}

#[async_trait]
impl<Req, Resp> Behavior<Req, Resp> for LoggingBehavior
where
    Req: Request<Response = Resp>,
    Resp: ResultType + Send + 'static,
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

        info!(
            request = Req::name(),
            response = type_name::<Resp>(),
            "handling request"
        );

        let started = Instant::now();
        let response = next(request, cancel).await;
        let elapsed = started.elapsed();

        if elapsed > self.slow_threshold {
            warn!(
                request = Req::name(),
                elapsed_ms = elapsed.as_millis() as u64,
                "slow request"
            );
        } else {
            info!(
                request = Req::name(),
                elapsed_ms = elapsed.as_millis() as u64,
                "handled request"
            );
        }

        response
    }
}
