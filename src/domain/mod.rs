//! # Domain Events
//!
//! Pending-event recording for domain entities and a broadcast publisher.
//! Entities record events as facts occur; the publisher drains each entity's
//! buffer atomically before publishing, so a re-entrant publish of the same
//! entity cannot redeliver.

mod publisher;

pub use publisher::DomainEventPublisher;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

/// A fact raised by the domain model.
pub trait DomainEvent: Send + Sync + fmt::Debug {
    /// Unique identifier of this event instance.
    fn event_id(&self) -> Uuid;

    /// When the event occurred.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Event name for logs and routing.
    fn name(&self) -> &'static str;
}

/// Append-only buffer of pending domain events owned by an entity.
///
/// Events leave the buffer only through [`EventRecorder::take_pending_events`],
/// which drains atomically and hands the caller an owned sequence — internal
/// storage is never exposed by reference.
#[derive(Debug, Default)]
pub struct EventRecorder {
    pending: Mutex<Vec<Arc<dyn DomainEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the pending buffer.
    pub fn record(&self, event: Arc<dyn DomainEvent>) {
        self.pending.lock().push(event);
    }

    /// Drain the pending buffer, returning events in recording order. The
    /// buffer is empty afterwards.
    pub fn take_pending_events(&self) -> Vec<Arc<dyn DomainEvent>> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Whether any events are waiting to be published.
    pub fn has_pending_events(&self) -> bool {
        !self.pending.lock().is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_events {
    use super::*;

    #[derive(Debug)]
    pub struct Recorded {
        pub event_id: Uuid,
        pub occurred_at: DateTime<Utc>,
    }

    impl Recorded {
        pub fn new() -> Self {
            Self {
                event_id: Uuid::new_v4(),
                occurred_at: Utc::now(),
            }
        }
    }

    impl DomainEvent for Recorded {
        fn event_id(&self) -> Uuid {
            self.event_id
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.occurred_at
        }

        fn name(&self) -> &'static str {
            "recorded"
        }
    }
}
