//! The privileged owner of a signal's abort transition.

use crate::reason::AbortReason;
use crate::signal::AbortSignal;

/// Owns exactly one [`AbortSignal`] and the sole capability to abort it.
///
/// Consumers receive the signal, which only exposes the read-and-subscribe
/// surface; the transition itself can be triggered from nowhere else.
/// Aborting is idempotent: only the first call has any effect.
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    /// Creates a controller with a fresh live signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signal: AbortSignal::new_live(),
        }
    }

    /// Returns the controller's signal.
    ///
    /// Every call returns the same underlying signal; clone the handle to
    /// hand it to consumers.
    #[must_use]
    pub fn signal(&self) -> &AbortSignal {
        &self.signal
    }

    /// Aborts the signal with the default "aborted without reason" marker.
    ///
    /// A no-op if the signal has already aborted.
    pub fn abort(&self) {
        self.signal.transition(AbortReason::default());
    }

    /// Aborts the signal with the given reason.
    ///
    /// A no-op if the signal has already aborted; the first reason wins.
    pub fn abort_with(&self, reason: AbortReason) {
        self.signal.transition(reason);
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AbortController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortController")
            .field("aborted", &self.signal.is_aborted())
            .field("reason", &self.signal.reason())
            .finish()
    }
}
