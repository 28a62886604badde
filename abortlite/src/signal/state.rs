//! Shared signal state: the abort transition, dependency bookkeeping, and
//! listener dispatch.
//!
//! Every [`AbortSignal`] handle is a thin wrapper over an
//! `Arc<SignalState>`. The state owns the graph edges between derived
//! signals and their root sources as plain strong references, kept
//! symmetric at all times and torn down in both directions inside the
//! abort transition itself, so an aborted signal holds nothing and is held
//! by nothing.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::reason::AbortReason;
use crate::signal::{AbortCallback, AbortSignal};

/// Shared state behind an [`AbortSignal`] handle.
///
/// All mutation goes through the mutex; the lock is never held while a
/// listener runs or while a second signal's lock is taken, so listeners
/// may freely query and mutate the dispatching signal.
pub(crate) struct SignalState {
    inner: Mutex<Inner>,
    /// Wakes `wait_for_abort` futures once the transition completes.
    notify: Notify,
}

#[derive(Default)]
struct Inner {
    /// `None` while live; set exactly once.
    reason: Option<AbortReason>,
    /// Insertion-ordered; unique per callback identity.
    listeners: Vec<AbortCallback>,
    /// Flattened root sources. `Some` only on derived signals, and never
    /// contains another derived signal.
    sources: Option<Vec<Arc<SignalState>>>,
    /// Derived signals currently listing this signal as a source.
    dependents: Vec<Arc<SignalState>>,
}

impl SignalState {
    /// Creates state for a live signal.
    pub(crate) fn new_live() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
        })
    }

    /// Creates state already in the aborted position, without dispatch.
    ///
    /// Used by the already-aborted factory and by `any` when an input is
    /// aborted at call time; nothing can have subscribed yet, so there are
    /// no listeners to invoke and no edges to tear down.
    pub(crate) fn new_aborted(reason: AbortReason) -> Arc<Self> {
        let state = Self::new_live();
        state.inner.lock().reason = Some(reason);
        state
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.inner.lock().reason.is_some()
    }

    pub(crate) fn reason(&self) -> Option<AbortReason> {
        self.inner.lock().reason.clone()
    }

    /// Registers a listener, keyed by `Arc` identity.
    ///
    /// Re-adding an already registered callback is a no-op, as is adding
    /// to an aborted signal (listeners are only owned while live).
    pub(crate) fn add_listener(&self, listener: AbortCallback) {
        let mut inner = self.inner.lock();
        if inner.reason.is_some() {
            return;
        }
        if inner
            .listeners
            .iter()
            .any(|registered| Arc::ptr_eq(registered, &listener))
        {
            return;
        }
        inner.listeners.push(listener);
    }

    /// Removes a listener by identity. Removing an absent listener is a
    /// no-op.
    pub(crate) fn remove_listener(&self, listener: &AbortCallback) {
        self.inner
            .lock()
            .listeners
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    /// Snapshot of the flattened root sources, `None` for root signals.
    pub(crate) fn sources(&self) -> Option<Vec<Arc<Self>>> {
        self.inner.lock().sources.clone()
    }

    /// Marks this signal as derived from the given flattened root set.
    pub(crate) fn set_sources(&self, sources: Vec<Arc<Self>>) {
        self.inner.lock().sources = Some(sources);
    }

    /// Records a derived signal as depending on this one.
    pub(crate) fn add_dependent(&self, dependent: Arc<Self>) {
        self.inner.lock().dependents.push(dependent);
    }

    /// The one-time live-to-aborted transition.
    ///
    /// Marks this signal and every current dependent aborted and tears
    /// down all graph edges before a single listener runs, then dispatches
    /// this signal's listeners followed by each dependent's. Calling this
    /// on an already aborted signal is a no-op.
    pub(crate) fn transition(self: &Arc<Self>, reason: AbortReason) {
        let dependents = {
            let mut inner = self.inner.lock();
            if inner.reason.is_some() {
                return;
            }
            inner.reason = Some(reason.clone());
            std::mem::take(&mut inner.dependents)
        };
        self.detach_from_sources();

        let mut newly_aborted = Vec::with_capacity(dependents.len());
        for dependent in dependents {
            let adopted = {
                let mut inner = dependent.inner.lock();
                if inner.reason.is_some() {
                    false
                } else {
                    inner.reason = Some(reason.clone());
                    true
                }
            };
            if adopted {
                dependent.detach_from_sources();
                newly_aborted.push(dependent);
            }
        }

        debug!(
            signal = ?Arc::as_ptr(self),
            dependents = newly_aborted.len(),
            "signal aborted"
        );

        self.invoke_and_clear();
        self.notify.notify_waiters();
        for dependent in &newly_aborted {
            dependent.invoke_and_clear();
            dependent.notify.notify_waiters();
        }
    }

    /// Removes this signal from every source's dependent set and drops the
    /// source references. No-op for root signals.
    fn detach_from_sources(self: &Arc<Self>) {
        let sources = self.inner.lock().sources.take();
        if let Some(sources) = sources {
            for source in sources {
                source
                    .inner
                    .lock()
                    .dependents
                    .retain(|dependent| !Arc::ptr_eq(dependent, self));
            }
        }
    }

    /// Dispatches the abort event and releases all listener storage.
    ///
    /// The set of listeners to invoke is fixed when dispatch begins: a
    /// listener added by another listener is not invoked in this pass,
    /// while one removed mid-dispatch is skipped. Removal is checked
    /// against the live collection, not the snapshot. A panicking listener
    /// is isolated and logged so the remaining listeners still run.
    fn invoke_and_clear(self: &Arc<Self>) {
        let snapshot = self.inner.lock().listeners.clone();
        if snapshot.is_empty() {
            return;
        }

        let signal = AbortSignal::from_state(Arc::clone(self));
        for listener in &snapshot {
            let still_registered = self
                .inner
                .lock()
                .listeners
                .iter()
                .any(|registered| Arc::ptr_eq(registered, listener));
            if !still_registered {
                continue;
            }

            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (**listener)(&signal))) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                warn!(
                    listener = ?Arc::as_ptr(listener),
                    "Abort listener panicked: {message}"
                );
            }
        }

        // Redelivery is never supported; release all listener storage.
        self.inner.lock().listeners.clear();
    }

    /// Suspends until the signal aborts, then yields the adopted reason.
    ///
    /// Resolves immediately when already aborted.
    pub(crate) async fn wait_for_abort(&self) -> AbortReason {
        loop {
            // Register for notification before checking the state, so a
            // transition between the check and the await cannot be missed.
            let notified = self.notify.notified();
            if let Some(reason) = self.reason() {
                return reason;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
impl SignalState {
    pub(crate) fn dependents_for_test(&self) -> Vec<Arc<Self>> {
        self.inner.lock().dependents.clone()
    }

    pub(crate) fn listener_count_for_test(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AbortError;

    fn noop_listener() -> AbortCallback {
        Arc::new(|_signal: &AbortSignal| {})
    }

    #[test]
    fn test_new_live_state() {
        let state = SignalState::new_live();
        assert!(!state.is_aborted());
        assert!(state.reason().is_none());
        assert!(state.sources().is_none());
        assert!(state.dependents_for_test().is_empty());
    }

    #[test]
    fn test_new_aborted_state() {
        let state = SignalState::new_aborted(AbortReason::new(AbortError));
        assert!(state.is_aborted());
        assert!(state.reason().is_some());
    }

    #[test]
    fn test_re_adding_same_listener_is_noop() {
        let state = SignalState::new_live();
        let listener = noop_listener();

        state.add_listener(Arc::clone(&listener));
        state.add_listener(Arc::clone(&listener));

        assert_eq!(state.listener_count_for_test(), 1);
    }

    #[test]
    fn test_add_listener_after_abort_is_dropped() {
        let state = SignalState::new_live();
        state.transition(AbortReason::default());

        state.add_listener(noop_listener());

        assert_eq!(state.listener_count_for_test(), 0);
    }

    #[test]
    fn test_remove_absent_listener_is_noop() {
        let state = SignalState::new_live();
        state.add_listener(noop_listener());

        state.remove_listener(&noop_listener());

        assert_eq!(state.listener_count_for_test(), 1);
    }

    #[test]
    fn test_transition_clears_listeners() {
        let state = SignalState::new_live();
        state.add_listener(noop_listener());
        state.add_listener(noop_listener());

        state.transition(AbortReason::default());

        assert_eq!(state.listener_count_for_test(), 0);
    }

    #[test]
    fn test_transition_is_exactly_once() {
        let state = SignalState::new_live();
        let first = AbortReason::new(AbortError);
        let second = AbortReason::new(AbortError);

        state.transition(first.clone());
        state.transition(second);

        let stored = state.reason().unwrap();
        assert!(stored.ptr_eq(&first));
    }
}
