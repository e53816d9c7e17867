//! The value-carrying outcome shape.

use std::future::Future;

use serde::de::{self, Deserializer};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::error::AppError;
use super::result::Outcome;

/// A value-carrying outcome: success holds exactly one `T`, failure holds one
/// or more [`AppError`]s plus a correlation id. Never both.
///
/// Reading the value of a failed outcome is a programming-logic fault and
/// panics loudly; [`TypedOutcome::value_or_default`] is the non-panicking
/// accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedOutcome<T> {
    value: Option<T>,
    errors: Vec<AppError>,
    error_id: Option<Uuid>,
}

impl<T> TypedOutcome<T> {
    /// A successful outcome carrying `value`.
    pub fn from_value(value: T) -> Self {
        Self {
            value: Some(value),
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
            value: None,
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
            value: None,
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

    /// Whether the outcome holds a value.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the outcome holds at least one error.
    pub fn is_failure(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The carried value.
    ///
    /// # Panics
    ///
    /// Panics when the outcome is a failure; use
    /// [`TypedOutcome::value_or_default`] or [`TypedOutcome::match_with`] when
    /// failure is a reachable state at the call site.
    pub fn value(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => panic!(
                "attempted to read the value of a failed outcome (error_id: {:?})",
                self.error_id
            ),
        }
    }

    /// The carried value, or `T::default()` on failure. Never panics.
    pub fn value_or_default(&self) -> T
    where
        T: Default + Clone,
    {
        self.value.clone().unwrap_or_default()
    }

    /// Consume the outcome, yielding the carried value.
    ///
    /// # Panics
    ///
    /// Panics when the outcome is a failure, like [`TypedOutcome::value`].
    pub fn into_value(self) -> T {
        match self.value {
            Some(value) => value,
            None => panic!(
                "attempted to take the value of a failed outcome (error_id: {:?})",
                self.error_id
            ),
        }
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

    /// Drop the value slot, keeping errors and correlation id, for merging
    /// with error-only outcomes.
    pub fn into_outcome(self) -> Outcome {
        if self.errors.is_empty() {
            Outcome::ok()
        } else {
            Outcome::from_errors(self.errors)
        }
    }

    /// Run exactly one branch depending on success, unifying to `U`. The
    /// success branch receives the carried value.
    pub fn match_with<U>(
        &self,
        on_success: impl FnOnce(&T) -> U,
        on_failure: impl FnOnce(&[AppError]) -> U,
    ) -> U {
        match &self.value {
            Some(value) => on_success(value),
            None => on_failure(&self.errors),
        }
    }

    /// Async variant of [`TypedOutcome::match_with`].
    pub async fn match_async<'a, U, FutS, FutF>(
        &'a self,
        on_success: impl FnOnce(&'a T) -> FutS,
        on_failure: impl FnOnce(&'a [AppError]) -> FutF,
    ) -> U
    where
        FutS: Future<Output = U>,
        FutF: Future<Output = U>,
    {
        match &self.value {
            Some(value) => on_success(value).await,
            None => on_failure(&self.errors).await,
        }
    }

    /// Run a fallible operation, converting any raised fault into a failure
    /// and a produced value into a success.
    pub fn capture<E>(op: impl FnOnce() -> std::result::Result<T, E>) -> Self
    where
        E: std::error::Error,
    {
        Self::capture_with(op, |fault| AppError::from_fault(fault))
    }

    /// [`TypedOutcome::capture`] with a caller-supplied fault-to-error mapper.
    pub fn capture_with<E>(
        op: impl FnOnce() -> std::result::Result<T, E>,
        mapper: impl FnOnce(&E) -> AppError,
    ) -> Self {
        match op() {
            Ok(value) => Self::from_value(value),
            Err(fault) => Self::from_error(mapper(&fault)),
        }
    }

    /// Async variant of [`TypedOutcome::capture`].
    pub async fn capture_async<E, Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::error::Error,
    {
        Self::capture_async_with(fut, |fault| AppError::from_fault(fault)).await
    }

    /// Async variant of [`TypedOutcome::capture_with`].
    pub async fn capture_async_with<E, Fut>(fut: Fut, mapper: impl FnOnce(&E) -> AppError) -> Self
    where
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        match fut.await {
            Ok(value) => Self::from_value(value),
            Err(fault) => Self::from_error(mapper(&fault)),
        }
    }
}

// The wire form carries an explicit `isSuccess` flag so a `null` value slot
// (a successful `Option` payload holding `None`) is not mistaken for an
// absent one after a round trip through the distributed cache tier.
impl<T: Serialize> Serialize for TypedOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TypedOutcome", 4)?;
        state.serialize_field("isSuccess", &self.is_success())?;
        match &self.value {
            Some(value) => state.serialize_field("value", value)?,
            None => state.skip_field("value")?,
        }
        state.serialize_field("errors", &self.errors)?;
        match self.error_id {
            Some(_) => state.serialize_field("errorId", &self.error_id)?,
            None => state.skip_field("errorId")?,
        }
        state.end()
    }
}

/// Marks the `value` field present even when its JSON form is `null`, leaving
/// `null` to `T`'s own deserializer instead of the surrounding `Option`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct TypedWire<T> {
    #[serde(rename = "isSuccess", default)]
    is_success: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    value: Option<T>,
    #[serde(default)]
    errors: Vec<AppError>,
    #[serde(rename = "errorId", default)]
    error_id: Option<Uuid>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for TypedOutcome<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = TypedWire::<T>::deserialize(deserializer)?;
        let success = wire.is_success.unwrap_or_else(|| wire.errors.is_empty());
        if success {
            if !wire.errors.is_empty() {
                return Err(de::Error::custom("successful outcome carries errors"));
            }
            match wire.value {
                Some(value) => Ok(Self {
                    value: Some(value),
                    errors: Vec::new(),
                    error_id: None,
                }),
                None => Err(de::Error::custom("successful outcome is missing its value")),
            }
        } else {
            Ok(Self {
                value: None,
                errors: if wire.errors.is_empty() {
                    vec![AppError::empty()]
                } else {
                    wire.errors
                },
                error_id: wire.error_id.or_else(|| Some(Uuid::new_v4())),
            })
        }
    }
}
