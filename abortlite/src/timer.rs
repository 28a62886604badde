//! One-shot delayed-callback scheduling.
//!
//! The timeout factory is the only part of the crate that needs a clock;
//! it reaches the environment through the [`TimerService`] seam so tests
//! and embedders can substitute their own scheduler.

use std::time::Duration;

/// A one-shot delayed-callback scheduler.
pub trait TimerService: Send + Sync {
    /// Invokes `callback` once, after at least `delay` has elapsed.
    ///
    /// There is no way to cancel a scheduled callback; implementations
    /// must always fire it eventually.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>);
}

/// Timer backed by the tokio runtime.
///
/// Scheduling spawns a task that sleeps for the delay and then runs the
/// callback, so `schedule` must be called within a runtime context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl TimerService for TokioTimer {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
    }
}
