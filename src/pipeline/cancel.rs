//! Cooperative cancellation for pipeline execution.

use tokio::sync::watch;

use crate::outcome::{make_failure, AppError, ResultType};

/// Owning side of a cancellation signal. Dropping the handle without calling
/// [`CancelHandle::cancel`] leaves every signal permanently uncancelled.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// A signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Cancel every signal derived from this handle.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation signal, checked by every behavior at each
/// suspension point. Cloned freely along the chain.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that can never be cancelled.
    pub fn none() -> Self {
        let (_sender, receiver) = watch::channel(false);
        Self { receiver }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// The failure surfaced when a behavior observes cancellation. Behaviors must
/// return this rather than swallow the signal.
pub(crate) fn cancellation_failure<R: ResultType>() -> R {
    make_failure(vec![AppError::with_metadata(
        "request cancelled",
        [("kind", "cancelled")],
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;

    #[test]
    fn signal_observes_its_handle() {
        let handle = CancelHandle::new();
        let signal = handle.signal();
        assert!(!signal.is_cancelled());

        handle.cancel();
        assert!(signal.is_cancelled());
        assert!(handle.signal().is_cancelled());
    }

    #[test]
    fn none_is_never_cancelled() {
        let signal = CancelSignal::none();
        assert!(!signal.is_cancelled());
        assert!(!signal.clone().is_cancelled());
    }

    #[test]
    fn cancellation_failure_is_tagged() {
        let outcome: Outcome = cancellation_failure();
        assert!(outcome.is_failure());
        assert_eq!(outcome.errors()[0].metadata()["kind"], "cancelled");
    }
}
