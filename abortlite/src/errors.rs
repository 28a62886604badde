//! Error types used as default abort reasons.
//!
//! A signal's reason is opaque to the core: any `Error + Send + Sync`
//! value can be supplied. The types here are the two markers the crate
//! constructs itself when no application reason is given.

use thiserror::Error;

/// Marker reason for a signal aborted without an explicit reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("signal is aborted without reason")]
pub struct AbortError;

/// Marker reason for a signal aborted by the timeout factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("signal timed out")]
pub struct TimeoutError;
