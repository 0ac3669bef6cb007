//! Concurrent fetcher with bounded, immediate retries.
//!
//! [`Fetcher`] spreads a list of endpoint paths across a bounded pool of Tokio
//! tasks. Each target is retried inside the task that picked it up, so one
//! target never holds more than one worker slot. Results are collected as tasks
//! finish, in completion order.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lbxd::fetch::{FetchOptions, Fetcher};
//! use lbxd::{ApiClient, ApiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ApiClient::new(ApiConfig::from_env()?)?);
//! let fetcher = Fetcher::new(FetchOptions::default())?;
//! let report = fetcher
//!     .fetch_all(client, vec!["film/2bbs".to_string(), "film/2b4m".to_string()])
//!     .await?;
//! println!(
//!     "ok: {}, missing: {}, failed: {}",
//!     report.successes.len(),
//!     report.not_found.len(),
//!     report.failed.len()
//! );
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::report::{FetchOutcome, FetchReport, FetchStats};
use super::retry::{
    DEFAULT_MAX_RETRIES, FailureClass, RetryDecision, RetryPolicy, classify_error,
};
use super::RequestIssuer;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 256;

/// Default worker count.
pub const DEFAULT_MAX_WORKERS: usize = 50;

/// Default number of completions between progress events.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1000;

/// Error type for systemic fetcher failures.
///
/// Per-target failures never surface here; they land in the report.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The rejected value.
        value: usize,
    },

    /// Progress interval of zero.
    #[error("invalid progress interval 0: must be at least 1")]
    InvalidProgressInterval,

    /// The worker pool stopped before every target resolved.
    #[error("worker pool failed: {message}")]
    Worker {
        /// What went wrong.
        message: String,
    },
}

/// Tuning knobs for a [`Fetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Targets in flight at once.
    pub max_workers: usize,
    /// Emit a progress event every this many completions.
    pub progress_interval: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_workers: DEFAULT_MAX_WORKERS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

type ProgressObserver = Box<dyn Fn(usize) + Send + Sync>;

/// Fetches many endpoint paths concurrently with bounded retries.
pub struct Fetcher {
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    retry_policy: RetryPolicy,
    progress_interval: usize,
    on_progress: Option<ProgressObserver>,
    on_completion: Option<ProgressObserver>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("max_workers", &self.max_workers)
            .field("retry_policy", &self.retry_policy)
            .field("progress_interval", &self.progress_interval)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_completion", &self.on_completion.is_some())
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher after validating `options`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidWorkerCount`] if `max_workers` is outside
    /// 1-256, or [`FetchError::InvalidProgressInterval`] if the interval is 0.
    #[instrument(level = "debug")]
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&options.max_workers) {
            return Err(FetchError::InvalidWorkerCount {
                value: options.max_workers,
            });
        }
        if options.progress_interval == 0 {
            return Err(FetchError::InvalidProgressInterval);
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(options.max_workers)),
            max_workers: options.max_workers,
            retry_policy: RetryPolicy::new(options.max_retries),
            progress_interval: options.progress_interval,
            on_progress: None,
            on_completion: None,
        })
    }

    /// Registers a callback that receives the cumulative completion count at
    /// every progress event.
    #[must_use]
    pub fn with_progress<F>(mut self, observer: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(observer));
        self
    }

    /// Registers a callback that receives the cumulative completion count after
    /// every resolved target, independent of the progress interval.
    #[must_use]
    pub fn with_completion<F>(mut self, observer: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_completion = Some(Box::new(observer));
        self
    }

    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    #[must_use]
    pub fn progress_interval(&self) -> usize {
        self.progress_interval
    }

    /// Processes every target and partitions the outcomes.
    ///
    /// A task is spawned for a target only once a worker permit is free, so at
    /// most `max_workers` run at a time. Finished tasks are drained while the
    /// rest are still being submitted. Each target resolves to exactly one of
    /// success, not-found or failed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Worker`] only if a worker task is cancelled or the
    /// pool is closed. Individual target failures do NOT cause this method to
    /// error.
    #[instrument(skip(self, issuer, targets), fields(max_workers = self.max_workers))]
    pub async fn fetch_all<I, T>(
        &self,
        issuer: Arc<I>,
        targets: impl IntoIterator<Item = T>,
    ) -> Result<FetchReport, FetchError>
    where
        I: RequestIssuer + ?Sized + 'static,
        T: Into<String>,
    {
        let stats = Arc::new(FetchStats::new());
        let mut tasks = JoinSet::new();
        let mut report = FetchReport::default();
        let mut processed = 0usize;

        info!("running fetcher");

        for target in targets {
            let target: String = target.into();

            // Wait for a free worker before spawning, so at most max_workers
            // tasks exist at once
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| FetchError::Worker {
                    message: "semaphore closed unexpectedly".to_string(),
                })?;

            let issuer = Arc::clone(&issuer);
            let stats = Arc::clone(&stats);
            let policy = self.retry_policy;

            tasks.spawn(async move {
                // Permit is released when the task finishes (RAII)
                let _permit = permit;

                let outcome = AssertUnwindSafe(fetch_with_retry(
                    &*issuer,
                    &target,
                    &policy,
                    &stats,
                ))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!(path = %target, "request issuer panicked");
                    FetchOutcome::Failed {
                        attempts: 0,
                        last_error: "request issuer panicked".to_string(),
                    }
                });

                (target, outcome)
            });

            while let Some(joined) = tasks.try_join_next() {
                self.record(&mut report, &mut processed, joined)?;
            }
        }

        debug!(task_count = tasks.len(), "waiting for remaining targets");

        while let Some(joined) = tasks.join_next().await {
            self.record(&mut report, &mut processed, joined)?;
        }

        info!(
            succeeded = report.successes.len(),
            not_found = report.not_found.len(),
            failed = report.failed.len(),
            attempts = stats.attempts(),
            retried = stats.retried(),
            "fetch complete"
        );

        Ok(report.with_stats(stats.snapshot()))
    }

    /// Adds one finished task to the report and fires progress events.
    fn record(
        &self,
        report: &mut FetchReport,
        processed: &mut usize,
        joined: Result<(String, FetchOutcome), tokio::task::JoinError>,
    ) -> Result<(), FetchError> {
        let (target, outcome) = joined.map_err(|e| FetchError::Worker {
            message: e.to_string(),
        })?;

        report.record(target, outcome);
        *processed += 1;

        if let Some(observer) = &self.on_completion {
            observer(*processed);
        }
        if *processed % self.progress_interval == 0 {
            info!(processed = *processed, "{} targets processed so far", *processed);
            if let Some(observer) = &self.on_progress {
                observer(*processed);
            }
        }
        Ok(())
    }
}

/// Convenience wrapper over [`Fetcher`] with positional options.
///
/// # Errors
///
/// Same as [`Fetcher::new`] and [`Fetcher::fetch_all`].
pub async fn fetch_all<I, T>(
    issuer: Arc<I>,
    targets: impl IntoIterator<Item = T>,
    max_retries: u32,
    max_workers: usize,
    progress_interval: usize,
) -> Result<FetchReport, FetchError>
where
    I: RequestIssuer + ?Sized + 'static,
    T: Into<String>,
{
    Fetcher::new(FetchOptions {
        max_retries,
        max_workers,
        progress_interval,
    })?
    .fetch_all(issuer, targets)
    .await
}

/// Runs the attempt loop for one target until it reaches a terminal outcome.
#[instrument(level = "debug", skip(issuer, policy, stats))]
async fn fetch_with_retry<I>(
    issuer: &I,
    path: &str,
    policy: &RetryPolicy,
    stats: &FetchStats,
) -> FetchOutcome
where
    I: RequestIssuer + ?Sized,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        stats.increment_attempts();

        let error = match issuer.issue(path).await {
            Ok(payload) => return FetchOutcome::Success(payload),
            Err(e) => e,
        };

        let class = classify_error(&error);
        if class == FailureClass::NotFound {
            debug!(path, "not found");
            return FetchOutcome::NotFound;
        }

        match policy.should_retry(class, attempt) {
            RetryDecision::Retry {
                attempt: next_attempt,
            } => {
                debug!(path, next_attempt, error = %error, "retrying");
                stats.increment_retried();
            }
            RetryDecision::DoNotRetry { reason } => {
                warn!(
                    path,
                    attempts = attempt,
                    error = %error,
                    %reason,
                    "target failed after all retries"
                );
                return FetchOutcome::Failed {
                    attempts: attempt,
                    last_error: error.to_string(),
                };
            }
        }
    }
}
