//! Retry classification for fetch attempts.
//!
//! A failed attempt is classified into a [`FailureClass`]:
//! - [`FailureClass::NotFound`] - the resource does not exist; terminal, never retried
//! - [`FailureClass::Transient`] - anything else; retried up to the policy bound
//!
//! There is no backoff: retries run immediately in the same worker. Callers
//! hitting a rate-limited endpoint should add their own delay.
//!
//! # Example
//!
//! ```
//! use lbxd::ApiError;
//! use lbxd::fetch::{FailureClass, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::new(2);
//! let error = ApiError::http_status("https://api.letterboxd.com/api/v0/film/2bbs", 503);
//! assert_eq!(classify_error(&error), FailureClass::Transient);
//! assert!(matches!(
//!     policy.should_retry(FailureClass::Transient, 1),
//!     RetryDecision::Retry { attempt: 2 }
//! ));
//! ```

use tracing::{debug, instrument};

use crate::api::{ApiError, NOT_FOUND_MARKER};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 15;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The resource does not exist. Recorded as not-found without retrying.
    NotFound,

    /// Timeouts, server errors, malformed bodies, connection failures.
    Transient,
}

/// Decision on whether to attempt a target again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempt again immediately.
    Retry {
        /// The attempt number about to run (1-indexed, so the first retry is 2).
        attempt: u32,
    },

    /// Stop attempting this target.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Bound on how many times a transient failure is retried.
///
/// A target gets at most `max_retries + 1` attempts in total; `max_retries = 0`
/// means exactly one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts a persistently failing target receives.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decides whether to retry after `attempt` (1-indexed) failed with `class`.
    #[instrument(level = "trace", skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, class: FailureClass, attempt: u32) -> RetryDecision {
        if class == FailureClass::NotFound {
            return RetryDecision::DoNotRetry {
                reason: "resource not found - retry would not help".to_string(),
            };
        }

        // attempt - 1 retries have been spent so far.
        if attempt > self.max_retries {
            debug!(attempt, "retries exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        RetryDecision::Retry {
            attempt: attempt + 1,
        }
    }
}

/// Classifies an attempt error.
///
/// Only the not-found marker at the start of the rendered error is inspected;
/// every other failure is transient.
#[must_use]
pub fn classify_error(error: &ApiError) -> FailureClass {
    if error.to_string().starts_with(NOT_FOUND_MARKER) {
        FailureClass::NotFound
    } else {
        FailureClass::Transient
    }
}
