//! # Abortlite
//!
//! A Rust implementation of the abort-controller-lite cancellation
//! primitives.
//!
//! Abortlite provides a minimal cooperative cancellation protocol built
//! around three pieces:
//!
//! - **Signals**: read-only cancellation state with exactly-once abort
//!   notification ([`AbortSignal`](signal::AbortSignal))
//! - **Controllers**: the privileged owner that triggers a signal's
//!   transition ([`AbortController`](controller::AbortController))
//! - **Composition**: derive one signal from many with "any-of" semantics
//!   and leak-free dependency bookkeeping ([`AbortSignal::any`](signal::AbortSignal::any))
//!
//! ## Quick Start
//!
//! ```rust
//! use abortlite::prelude::*;
//!
//! let controller = AbortController::new();
//! let signal = controller.signal().clone();
//!
//! signal.on_abort(|signal| {
//!     println!("aborted: {:?}", signal.reason());
//! });
//!
//! controller.abort();
//! assert!(signal.is_aborted());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod controller;
pub mod errors;
pub mod reason;
pub mod signal;
pub mod timer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::controller::AbortController;
    pub use crate::errors::{AbortError, TimeoutError};
    pub use crate::reason::AbortReason;
    pub use crate::signal::{AbortCallback, AbortSignal};
    pub use crate::timer::{TimerService, TokioTimer};
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
