//! Abort signals: cancellation state, subscription, and composition.
//!
//! An [`AbortSignal`] is the read-only view handed to consumers. It is
//! created live by an [`AbortController`](crate::controller::AbortController)
//! or one of the factories here, and transitions to aborted at most once.
//! Signals created by [`AbortSignal::any`] are *derived*: they abort as
//! soon as any of their root sources does, and the dependency edges in
//! both directions are released inside that same transition.

mod state;

use std::sync::Arc;
use std::time::Duration;

pub(crate) use state::SignalState;

use crate::reason::AbortReason;
use crate::timer::{TimerService, TokioTimer};

/// A callback registered for a signal's abort event.
///
/// The `Arc` is the callback's identity: adding the same handle twice is a
/// no-op, and [`AbortSignal::remove_listener`] matches by pointer rather
/// than by value.
pub type AbortCallback = Arc<dyn Fn(&AbortSignal) + Send + Sync>;

/// Read-only view of a cancellation signal.
///
/// Handles are cheap to clone and all clones observe the same underlying
/// signal. Consumers can query the state, subscribe to the abort event, or
/// await it; only the owning controller or the crate's factories can
/// trigger the transition itself.
#[derive(Clone)]
pub struct AbortSignal {
    state: Arc<SignalState>,
}

impl AbortSignal {
    /// Creates a live, non-derived signal.
    pub(crate) fn new_live() -> Self {
        Self::from_state(SignalState::new_live())
    }

    pub(crate) fn from_state(state: Arc<SignalState>) -> Self {
        Self { state }
    }

    /// The privileged live-to-aborted transition.
    ///
    /// Reachable only through [`AbortController`](crate::controller::AbortController)
    /// and the factories in this module.
    pub(crate) fn transition(&self, reason: AbortReason) {
        self.state.transition(reason);
    }

    /// Returns whether the signal has aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state.is_aborted()
    }

    /// Returns the abort reason, or `None` while the signal is live.
    ///
    /// Stable once set: every call after the transition returns the same
    /// value.
    #[must_use]
    pub fn reason(&self) -> Option<AbortReason> {
        self.state.reason()
    }

    /// Returns the stored reason as an error if the signal has aborted.
    ///
    /// The cancellation-aware analogue of a guard clause: call it at the
    /// top of a unit of work to bail out early.
    pub fn error_if_aborted(&self) -> Result<(), AbortReason> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Registers a listener for the abort event.
    ///
    /// Listeners run in registration order when the signal aborts, each
    /// receiving this signal as its argument, and are invoked at most
    /// once. Re-adding an already registered callback is a no-op, and a
    /// callback added after the signal has aborted is dropped without
    /// being invoked.
    pub fn add_listener(&self, listener: AbortCallback) {
        self.state.add_listener(listener);
    }

    /// Removes a previously registered listener by identity.
    ///
    /// Removing an absent listener is a no-op. A listener removed while
    /// dispatch is in progress is skipped if it has not yet run.
    pub fn remove_listener(&self, listener: &AbortCallback) {
        self.state.remove_listener(listener);
    }

    /// Registers a closure for the abort event and returns its identity
    /// handle, which can later be passed to [`remove_listener`](Self::remove_listener).
    pub fn on_abort<F>(&self, listener: F) -> AbortCallback
    where
        F: Fn(&AbortSignal) + Send + Sync + 'static,
    {
        let callback: AbortCallback = Arc::new(listener);
        self.add_listener(Arc::clone(&callback));
        callback
    }

    /// Suspends until the signal aborts, then yields the reason.
    ///
    /// Resolves immediately when the signal has already aborted.
    pub async fn wait_for_abort(&self) -> AbortReason {
        self.state.wait_for_abort().await
    }

    /// Returns whether two handles observe the same underlying signal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Creates a signal already in the aborted state, carrying the default
    /// "aborted without reason" marker.
    #[must_use]
    pub fn already_aborted() -> Self {
        Self::already_aborted_with(AbortReason::default())
    }

    /// Creates a signal already in the aborted state with the given
    /// reason.
    #[must_use]
    pub fn already_aborted_with(reason: AbortReason) -> Self {
        Self::from_state(SignalState::new_aborted(reason))
    }

    /// Derives a signal that aborts as soon as any input signal does.
    ///
    /// The input is consumed exactly once and may be empty or contain
    /// duplicates. If some input is already aborted, the result is created
    /// aborted with the reason of the first such input, and no edges are
    /// wired. Otherwise the result depends on the flattened root set of
    /// all inputs: a derived input contributes its own root sources rather
    /// than itself, so chains of `any` collapse to a single hop and an
    /// abort never cascades recursively.
    ///
    /// When a root source later aborts, the result adopts its reason, is
    /// detached from every source it still lists, and dispatches its own
    /// listeners after the root's. Afterwards no reference survives in
    /// either direction.
    ///
    /// An empty input yields a live signal that can never abort.
    #[must_use]
    pub fn any<I>(signals: I) -> Self
    where
        I: IntoIterator<Item = AbortSignal>,
    {
        let signals: Vec<AbortSignal> = signals.into_iter().collect();

        for signal in &signals {
            if let Some(reason) = signal.reason() {
                return Self::already_aborted_with(reason);
            }
        }

        let result = SignalState::new_live();
        let mut sources: Vec<Arc<SignalState>> = Vec::new();
        for signal in &signals {
            match signal.state.sources() {
                // Root input: depend on it directly.
                None => link(&mut sources, &signal.state, &result),
                // Derived input: depend on its flattened roots instead.
                Some(roots) => {
                    for root in &roots {
                        link(&mut sources, root, &result);
                    }
                }
            }
        }
        result.set_sources(sources);

        Self::from_state(result)
    }

    /// Creates a live signal that aborts with a [`TimeoutError`](crate::errors::TimeoutError)
    /// reason once `delay` has elapsed, using the tokio-backed timer.
    ///
    /// Must be called within a tokio runtime context. The pending timer
    /// cannot be cancelled; a callback firing after the signal became
    /// otherwise unreachable is a harmless no-op.
    #[must_use]
    pub fn timeout(delay: Duration) -> Self {
        Self::timeout_with(&TokioTimer, delay)
    }

    /// Like [`timeout`](Self::timeout), but scheduled on the given timer
    /// service.
    pub fn timeout_with<T>(timer: &T, delay: Duration) -> Self
    where
        T: TimerService + ?Sized,
    {
        let signal = Self::new_live();
        let state = Arc::clone(&signal.state);
        timer.schedule(
            delay,
            Box::new(move || {
                state.transition(AbortReason::new(crate::errors::TimeoutError));
            }),
        );
        signal
    }
}

/// Adds one `result`-depends-on-`root` edge, deduplicating by identity.
fn link(
    sources: &mut Vec<Arc<SignalState>>,
    root: &Arc<SignalState>,
    dependent: &Arc<SignalState>,
) {
    if sources.iter().any(|existing| Arc::ptr_eq(existing, root)) {
        return;
    }
    sources.push(Arc::clone(root));
    root.add_dependent(Arc::clone(dependent));
}

impl std::fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .field("reason", &self.reason())
            .finish()
    }
}
