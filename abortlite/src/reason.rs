//! Opaque abort reasons.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::errors::{AbortError, TimeoutError};

/// The opaque value explaining why a signal aborted.
///
/// Reasons are cheap to clone and keep their identity across propagation:
/// the reason observed on a derived signal is the same allocation as the
/// one supplied to the root signal's abort call, which
/// [`AbortReason::ptr_eq`] can verify.
///
/// The core never inspects or validates a reason; it only stores and
/// forwards it.
#[derive(Clone)]
pub struct AbortReason(Arc<dyn Error + Send + Sync>);

impl AbortReason {
    /// Wraps an error value as an abort reason.
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Wraps an already shared error value without re-allocating.
    #[must_use]
    pub fn from_arc(error: Arc<dyn Error + Send + Sync>) -> Self {
        Self(error)
    }

    /// Returns whether `self` and `other` wrap the same underlying value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns whether the wrapped error is of type `E`.
    #[must_use]
    pub fn is<E>(&self) -> bool
    where
        E: Error + 'static,
    {
        self.downcast_ref::<E>().is_some()
    }

    /// Borrows the wrapped error as a concrete type, if it matches.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        self.0.downcast_ref::<E>()
    }
}

impl Default for AbortReason {
    /// The "aborted without explicit reason" marker.
    fn default() -> Self {
        Self::new(AbortError)
    }
}

impl From<AbortError> for AbortReason {
    fn from(error: AbortError) -> Self {
        Self::new(error)
    }
}

impl From<TimeoutError> for AbortReason {
    fn from(error: TimeoutError) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl Error for AbortReason {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0 as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reason_is_abort_error() {
        let reason = AbortReason::default();
        assert!(reason.is::<AbortError>());
        assert_eq!(reason.to_string(), "signal is aborted without reason");
    }

    #[test]
    fn test_clone_preserves_identity() {
        let reason = AbortReason::new(TimeoutError);
        let clone = reason.clone();
        assert!(reason.ptr_eq(&clone));
    }

    #[test]
    fn test_distinct_reasons_are_not_identical() {
        let first = AbortReason::new(AbortError);
        let second = AbortReason::new(AbortError);
        assert!(!first.ptr_eq(&second));
    }

    #[test]
    fn test_downcast_to_concrete_error() {
        let reason = AbortReason::new(TimeoutError);
        assert!(reason.downcast_ref::<TimeoutError>().is_some());
        assert!(reason.downcast_ref::<AbortError>().is_none());
    }

    #[test]
    fn test_source_exposes_wrapped_error() {
        let reason = AbortReason::new(TimeoutError);
        let source = Error::source(&reason);
        assert!(source.is_some());
    }
}
