//! The error-only outcome shape and the free functions over it.

use std::future::Future;

use serde::de::{self, Deserializer};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::error::AppError;

/// An error-only outcome: success carries nothing, failure carries one or
/// more [`AppError`]s plus a correlation id.
///
/// Invariants: `is_success() == errors.is_empty()`, and `error_id` is `Some`
/// exactly when the outcome is a failure. The id is freshly generated per
/// failure construction, never reused even for identical error lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    errors: Vec<AppError>,
    error_id: Option<Uuid>,
}

impl Outcome {
    /// A successful outcome. Allocation-free.
    pub const fn ok() -> Self {
        Self {
            errors: Vec::new(),
            error_id: None,
        }
    }

    /// A failure carrying the distinguished empty error.
    pub fn failed() -> Self {
        Self::from_error(AppError::empty())
    }

    /// A failure carrying a message-only error.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::from_error(AppError::new(message))
    }

    /// A failure carrying the given error.
    pub fn from_error(error: AppError) -> Self {
        Self {
            errors: vec![error],
            error_id: Some(Uuid::new_v4()),
        }
    }

    /// A failure carrying the given errors in order. An empty list degrades
    /// to the distinguished empty error so the success invariant holds.
    pub fn from_errors(errors: Vec<AppError>) -> Self {
        if errors.is_empty() {
            return Self::failed();
        }
        Self {
            errors,
            error_id: Some(Uuid::new_v4()),
        }
    }

    /// A failure converted from a caught native fault.
    pub fn from_fault<E>(fault: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::from_error(AppError::from_fault(fault))
    }

    /// Whether the outcome holds no errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the outcome holds at least one error.
    pub fn is_failure(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The errors, in the order they were attached; empty on success.
    pub fn errors(&self) -> &[AppError] {
        &self.errors
    }

    /// Consume the outcome, yielding its error list (empty on success).
    pub fn into_errors(self) -> Vec<AppError> {
        self.errors
    }

    /// Correlation id for this failure; `None` exactly when successful.
    pub fn error_id(&self) -> Option<Uuid> {
        self.error_id
    }

    /// Run exactly one branch depending on success, unifying to `U`.
    pub fn match_with<U>(
        &self,
        on_success: impl FnOnce() -> U,
        on_failure: impl FnOnce(&[AppError]) -> U,
    ) -> U {
        if self.is_success() {
            on_success()
        } else {
            on_failure(&self.errors)
        }
    }

    /// Async variant of [`Outcome::match_with`].
    pub async fn match_async<'a, U, FutS, FutF>(
        &'a self,
        on_success: impl FnOnce() -> FutS,
        on_failure: impl FnOnce(&'a [AppError]) -> FutF,
    ) -> U
    where
        FutS: Future<Output = U>,
        FutF: Future<Output = U>,
    {
        if self.is_success() {
            on_success().await
        } else {
            on_failure(&self.errors).await
        }
    }

    /// Run a fallible operation, converting any raised fault into a failure.
    ///
    /// This is the sanctioned boundary where native faults enter the algebra;
    /// no fault may cross a handler or behavior boundary unconverted.
    pub fn capture<E>(op: impl FnOnce() -> std::result::Result<(), E>) -> Self
    where
        E: std::error::Error,
    {
        Self::capture_with(op, |fault| AppError::from_fault(fault))
    }

    /// [`Outcome::capture`] with a caller-supplied fault-to-error mapper.
    pub fn capture_with<E>(
        op: impl FnOnce() -> std::result::Result<(), E>,
        mapper: impl FnOnce(&E) -> AppError,
    ) -> Self {
        match op() {
            Ok(()) => Self::ok(),
            Err(fault) => Self::from_error(mapper(&fault)),
        }
    }

    /// Async variant of [`Outcome::capture`].
    pub async fn capture_async<E, Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = std::result::Result<(), E>>,
        E: std::error::Error,
    {
        Self::capture_async_with(fut, |fault| AppError::from_fault(fault)).await
    }

    /// Async variant of [`Outcome::capture_with`].
    pub async fn capture_async_with<E, Fut>(fut: Fut, mapper: impl FnOnce(&E) -> AppError) -> Self
    where
        Fut: Future<Output = std::result::Result<(), E>>,
    {
        match fut.await {
            Ok(()) => Self::ok(),
            Err(fault) => Self::from_error(mapper(&fault)),
        }
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::ok()
    }
}

// The wire form carries an explicit `isSuccess` flag alongside the error
// list; `errorId` is omitted on success.
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Outcome", 3)?;
        state.serialize_field("isSuccess", &self.is_success())?;
        state.serialize_field("errors", &self.errors)?;
        match self.error_id {
            Some(_) => state.serialize_field("errorId", &self.error_id)?,
            None => state.skip_field("errorId")?,
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct OutcomeWire {
    #[serde(rename = "isSuccess", default)]
    is_success: Option<bool>,
    #[serde(default)]
    errors: Vec<AppError>,
    #[serde(rename = "errorId", default)]
    error_id: Option<Uuid>,
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = OutcomeWire::deserialize(deserializer)?;
        if let Some(flag) = wire.is_success {
            if flag != wire.errors.is_empty() {
                return Err(de::Error::custom("isSuccess disagrees with the error list"));
            }
        }
        if wire.errors.is_empty() {
            Ok(Self::ok())
        } else {
            Ok(Self {
                errors: wire.errors,
                error_id: wire.error_id.or_else(|| Some(Uuid::new_v4())),
            })
        }
    }
}

/// Merge independent outcomes: success iff every input succeeds, otherwise a
/// single failure concatenating all input error lists in input order. Zero
/// inputs is success.
pub fn merge(outcomes: impl IntoIterator<Item = Outcome>) -> Outcome {
    let errors: Vec<AppError> = outcomes
        .into_iter()
        .flat_map(Outcome::into_errors)
        .collect();

    if errors.is_empty() {
        Outcome::ok()
    } else {
        Outcome::from_errors(errors)
    }
}
