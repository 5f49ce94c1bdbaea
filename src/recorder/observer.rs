//! Observer fan-out
//!
//! Delivery of committed state changes, finished artifacts, and errors to
//! registered observers. Observers are invoked in registration order after
//! each commit; a panicking observer is isolated and logged so it can never
//! corrupt controller state or starve observers registered after it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::error::SessionError;
use crate::recorder::state::RecordingState;

/// A consumer of session events.
///
/// All methods default to no-ops, so an observer implements only the
/// capabilities it cares about (state changes, the finished artifact,
/// errors) rather than subclassing a monolithic listener.
///
/// Callbacks run while the controller holds its registry lock, which is
/// not reentrant. An observer must not call back into
/// `SessionController::add_observer` or `attach_notification_surface`
/// from inside a callback; doing so deadlocks. Register from outside, or
/// hand the controller handle to a separate task.
pub trait SessionObserver: Send {
    /// A state transition was committed.
    fn on_state_change(&mut self, state: &RecordingState) {
        let _ = state;
    }

    /// A session finished successfully; `artifact` is the absolute output
    /// path. Emitted exactly once per session, before the `Idle` state
    /// change that follows it.
    fn on_finished(&mut self, artifact: &Path) {
        let _ = artifact;
    }

    /// A command or backend operation failed.
    fn on_error(&mut self, error: &SessionError) {
        let _ = error;
    }
}

/// Ordered collection of observers with isolated dispatch.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<Box<dyn SessionObserver>>,
}

impl ObserverRegistry {
    /// Append an observer. It will be invoked after all earlier
    /// registrations. When `current` is given, that state is replayed to
    /// the new observer alone so late registrants can render the session
    /// they joined.
    pub fn add(&mut self, mut observer: Box<dyn SessionObserver>, current: Option<&RecordingState>) {
        if let Some(state) = current {
            if catch_unwind(AssertUnwindSafe(|| observer.on_state_change(state))).is_err() {
                tracing::error!("observer panicked during registration replay");
            }
        }
        self.observers.push(observer);
    }

    /// Deliver a committed state change to every observer in order.
    pub fn notify_state(&mut self, state: &RecordingState) {
        self.dispatch(|observer| observer.on_state_change(state));
    }

    /// Deliver the finished artifact to every observer in order.
    pub fn notify_finished(&mut self, artifact: &Path) {
        self.dispatch(|observer| observer.on_finished(artifact));
    }

    /// Deliver an error to every observer in order.
    pub fn notify_error(&mut self, error: &SessionError) {
        self.dispatch(|observer| observer.on_error(error));
    }

    fn dispatch(&mut self, mut deliver: impl FnMut(&mut Box<dyn SessionObserver>)) {
        for (index, observer) in self.observers.iter_mut().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| deliver(observer))).is_err() {
                tracing::error!("observer {} panicked during dispatch; skipping", index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct Tape {
        tx: mpsc::Sender<String>,
    }

    impl SessionObserver for Tape {
        fn on_state_change(&mut self, state: &RecordingState) {
            let _ = self.tx.send(format!("state:{state:?}"));
        }

        fn on_finished(&mut self, artifact: &Path) {
            let _ = self.tx.send(format!("finished:{}", artifact.display()));
        }
    }

    struct Bomb;

    impl SessionObserver for Bomb {
        fn on_state_change(&mut self, _state: &RecordingState) {
            panic!("observer blew up");
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();

        let mut registry = ObserverRegistry::default();
        registry.add(Box::new(Tape { tx: tx_a }), None);
        registry.add(Box::new(Tape { tx: tx_b }), None);

        registry.notify_state(&RecordingState::Recording);
        registry.notify_finished(Path::new("/tmp/out.mp4"));

        for rx in [rx_a, rx_b] {
            assert_eq!(rx.recv().unwrap(), "state:Recording");
            assert_eq!(rx.recv().unwrap(), "finished:/tmp/out.mp4");
        }
    }

    #[test]
    fn test_panicking_observer_does_not_block_later_ones() {
        let (tx, rx) = mpsc::channel();

        let mut registry = ObserverRegistry::default();
        registry.add(Box::new(Bomb), None);
        registry.add(Box::new(Tape { tx }), None);

        registry.notify_state(&RecordingState::Paused);
        assert_eq!(rx.recv().unwrap(), "state:Paused");
    }
}
