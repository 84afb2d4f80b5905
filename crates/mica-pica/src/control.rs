//! Cooperative cancellation and the completed-or-cancelled outcome type.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked at every suspension point of an alignment run.
///
/// Clones observe the same flag, so a caller keeps one handle and passes
/// another into the run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every run holding this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Return true once [`cancel`][Self::cancel] was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of a run that may be cancelled.
///
/// Cancellation is not an error: it carries no partial result.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T> {
    /// The run finished.
    Completed(T),
    /// The run observed a cancellation request and stopped.
    Cancelled,
}

impl<T> Outcome<T> {
    /// Return the completed value, or `None` if cancelled.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    /// Return true if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Transform the completed value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Completed(value) => Outcome::Completed(f(value)),
            Self::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Return early with [`Outcome::Cancelled`] if the token is set.
#[macro_export]
macro_rules! bail_if_cancelled {
    ($token:expr) => {
        if $token.is_cancelled() {
            return Ok($crate::Outcome::Cancelled);
        }
    };
}
