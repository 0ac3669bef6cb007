//! Concurrent fetching of many API endpoints with bounded retries.
//!
//! - [`Fetcher`] - bounded worker pool, completion-order collection, progress events
//! - [`RetryPolicy`] / [`classify_error`] - not-found is terminal, everything else retries
//! - [`FetchReport`] - successes, not-found targets and failed targets
//! - [`RequestIssuer`] - the seam the fetcher calls once per attempt
//!
//! The fetcher does not interpret payloads; each success is the parsed JSON
//! body exactly as the issuer returned it.

mod engine;
mod report;
mod retry;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::ApiError;

pub use engine::{
    DEFAULT_MAX_WORKERS, DEFAULT_PROGRESS_INTERVAL, FetchError, FetchOptions, Fetcher, fetch_all,
};
pub use report::{FailedTarget, FetchOutcome, FetchReport, FetchStats};
pub use retry::{DEFAULT_MAX_RETRIES, FailureClass, RetryDecision, RetryPolicy, classify_error};

/// Issues one request for an endpoint path and returns the parsed body.
///
/// Implementations signal a missing resource with an error whose rendered
/// message starts with [`NOT_FOUND_MARKER`](crate::api::NOT_FOUND_MARKER), as
/// [`ApiError::NotFound`] does. Any other error is treated as retryable.
#[async_trait]
pub trait RequestIssuer: Send + Sync {
    /// Performs a single attempt for `target`.
    async fn issue(&self, target: &str) -> Result<Value, ApiError>;
}
