//! Validation behavior: concurrent validators, short-circuit on failure.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use super::cancel::{cancellation_failure, CancelSignal};
use super::{Behavior, Next};
use crate::outcome::{make_failure, AppError, ResultType};
use crate::request::{Request, RequestKind};

/// Severity of a single field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// One field-level validation failure reported by a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Name of the offending field
    pub field: String,
    /// Human-readable failure text; becomes the error message
    pub message: String,
    /// Machine-readable failure code
    pub code: String,
    /// How serious the failure is
    pub severity: Severity,
    /// The rejected input, rendered as text
    pub attempted_value: String,
}

impl From<&FieldFailure> for AppError {
    fn from(failure: &FieldFailure) -> Self {
        AppError::with_metadata(
            failure.message.clone(),
            [
                ("field", failure.field.clone()),
                ("code", failure.code.clone()),
                ("severity", failure.severity.to_string()),
                ("attempted_value", failure.attempted_value.clone()),
            ],
        )
    }
}

/// A request validator. Multiple validators may be registered per request
/// type; all run to completion before verdicts are merged.
#[async_trait]
pub trait Validator<Req>: Send + Sync {
    async fn validate(&self, request: &Req) -> Vec<FieldFailure>;
}

/// Runs every registered validator for the request concurrently and, if any
/// field failures exist, returns a failed response of the exact static type
/// the caller expects without invoking the inner chain.
///
/// Applies to command and query requests; other kinds pass straight through.
pub struct ValidationBehavior<Req> {
    validators: Vec<Arc<dyn Validator<Req>>>,
}

impl<Req> ValidationBehavior<Req> {
    pub fn new(validators: Vec<Arc<dyn Validator<Req>>>) -> Self {
        Self { validators }
    }
}

#[async_trait]
impl<Req, Resp> Behavior<Req, Resp> for ValidationBehavior<Req>
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

        if !matches!(Req::kind(), RequestKind::Command | RequestKind::Query)
            || self.validators.is_empty()
        {
            return next(request, cancel).await;
        }

        let checks = self
            .validators
            .iter()
            .map(|validator| validator.validate(request.as_ref()));
        let verdicts = join_all(checks).await;

        if cancel.is_cancelled() {
            return cancellation_failure();
        }

        let errors: Vec<AppError> = verdicts
            .iter()
            .flatten()
            .map(AppError::from)
            .collect();

        if !errors.is_empty() {
            debug!(
                request = Req::name(),
                failures = errors.len(),
                "validation failed; short-circuiting"
            );
            return make_failure(errors);
        }

        next(request, cancel).await
    }
}
