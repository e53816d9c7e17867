//! # Outcome Algebra
//!
//! The explicit success/failure value types returned by every handler and
//! behavior in the pipeline. Two shapes exist:
//!
//! - [`Outcome`] — error-only ("no value"): an append-only error list plus a
//!   correlation id assigned on failure.
//! - [`TypedOutcome<T>`] — value-carrying: exactly one of a value or a
//!   non-empty error list.
//!
//! Native faults enter the algebra only through the `capture` family; no
//! panic or error type crosses a handler or behavior boundary unconverted.
//!
//! The [`ResultType`] capability trait lets generic pipeline code construct a
//! failure of whatever concrete response type the caller expects, resolved at
//! compile time.

mod error;
mod result;
mod typed;

pub use error::AppError;
pub use result::{merge, Outcome};
pub use typed::TypedOutcome;

/// Capability trait over both outcome shapes, enabling type-directed failure
/// construction from generic code (the validation behavior, the dispatcher).
pub trait ResultType: Sized + Send {
    /// Build a failure of this concrete type from the given errors.
    fn from_errors(errors: Vec<AppError>) -> Self;

    /// Whether this outcome holds no errors.
    fn is_success(&self) -> bool;

    /// The errors held by this outcome; empty on success.
    fn errors(&self) -> &[AppError];
}

impl ResultType for Outcome {
    fn from_errors(errors: Vec<AppError>) -> Self {
        Outcome::from_errors(errors)
    }

    fn is_success(&self) -> bool {
        Outcome::is_success(self)
    }

    fn errors(&self) -> &[AppError] {
        Outcome::errors(self)
    }
}

impl<T: Send> ResultType for TypedOutcome<T> {
    fn from_errors(errors: Vec<AppError>) -> Self {
        TypedOutcome::from_errors(errors)
    }

    fn is_success(&self) -> bool {
        TypedOutcome::is_success(self)
    }

    fn errors(&self) -> &[AppError] {
        TypedOutcome::errors(self)
    }
}

/// Build a failed response of the statically-expected type `R`.
pub fn make_failure<R: ResultType>(errors: Vec<AppError>) -> R {
    R::from_errors(errors)
}
