//! Structured error values carried inside the outcome algebra.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable failure description: a human-readable message plus ordered
/// string metadata with unique keys.
///
/// The error taxonomy (plain, empty, fault-derived, validation-derived) is a
/// naming convention over constructor provenance; every flavor is an instance
/// of this one type. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    message: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl AppError {
    /// The distinguished empty error: no message, no metadata.
    pub fn empty() -> Self {
        Self {
            message: String::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// An error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// An error carrying a message and metadata pairs. Later duplicate keys
    /// overwrite earlier ones.
    pub fn with_metadata<K, V, I>(message: impl Into<String>, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            message: message.into(),
            metadata: metadata
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// An error derived from a caught native fault, capturing the fault kind,
    /// its immediate origin, and the full source chain as diagnostic metadata.
    pub fn from_fault<E>(fault: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), std::any::type_name::<E>().to_string());

        if let Some(origin) = fault.source() {
            metadata.insert("origin".to_string(), origin.to_string());

            let mut trace = Vec::new();
            let mut current: Option<&dyn std::error::Error> = Some(origin);
            while let Some(cause) = current {
                trace.push(cause.to_string());
                current = cause.source();
            }
            metadata.insert("trace".to_string(), trace.join(" -> "));
        }

        Self {
            message: fault.to_string(),
            metadata,
        }
    }

    /// The error message; empty for the distinguished empty error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Ordered metadata describing the failure.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Whether this is the distinguished empty error.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.metadata.is_empty()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.metadata.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{} (", self.message)?;
        for (index, (key, value)) in self.metadata.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, ")")
    }
}
