//! Outcomes and aggregate results of a fetch run.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde_json::Value;

/// Terminal result of processing one target.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The parsed response body.
    Success(Value),

    /// The resource does not exist.
    NotFound,

    /// Every allowed attempt failed with a transient error.
    Failed {
        /// Attempts made, including the first.
        attempts: u32,
        /// Message of the error from the final attempt.
        last_error: String,
    },
}

/// A target that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTarget {
    pub target: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Partitioned results of [`Fetcher::fetch_all`](super::Fetcher::fetch_all).
///
/// Every submitted target lands in exactly one of `successes`, `not_found` or
/// `failed`. All three are in completion order, not submission order.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Parsed bodies of successful targets.
    pub successes: Vec<Value>,
    /// Targets that resolved to not-found.
    pub not_found: Vec<String>,
    /// Targets that exhausted their retries.
    pub failed: Vec<FailedTarget>,
    stats: FetchStats,
}

impl FetchReport {
    pub(crate) fn with_stats(mut self, stats: FetchStats) -> Self {
        self.stats = stats;
        self
    }

    /// Records one terminal outcome.
    pub(crate) fn record(&mut self, target: String, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Success(payload) => self.successes.push(payload),
            FetchOutcome::NotFound => self.not_found.push(target),
            FetchOutcome::Failed {
                attempts,
                last_error,
            } => self.failed.push(FailedTarget {
                target,
                attempts,
                last_error,
            }),
        }
    }

    /// Number of targets processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes.len() + self.not_found.len() + self.failed.len()
    }

    /// Paths of the targets that exhausted their retries.
    pub fn failed_targets(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|f| f.target.as_str())
    }

    /// Counters collected while the run was in flight.
    #[must_use]
    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }
}

/// Counters for a fetch run.
///
/// Updated from concurrent worker tasks, so every counter is atomic.
#[derive(Debug, Default)]
pub struct FetchStats {
    attempts: AtomicUsize,
    retried: AtomicUsize,
}

impl FetchStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requests issued, first attempts and retries alike.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Requests that were retries of an earlier failed attempt.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    pub(crate) fn increment_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> Self {
        let copy = Self::new();
        copy.attempts.store(self.attempts(), Ordering::SeqCst);
        copy.retried.store(self.retried(), Ordering::SeqCst);
        copy
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_record_partitions_outcomes() {
        let mut report = FetchReport::default();
        report.record("film/a".to_string(), FetchOutcome::Success(json!({"id": "a"})));
        report.record("film/b".to_string(), FetchOutcome::NotFound);
        report.record(
            "film/c".to_string(),
            FetchOutcome::Failed {
                attempts: 3,
                last_error: "HTTP 503 calling film/c".to_string(),
            },
        );

        assert_eq!(report.successes, vec![json!({"id": "a"})]);
        assert_eq!(report.not_found, vec!["film/b".to_string()]);
        assert_eq!(report.failed_targets().collect::<Vec<_>>(), vec!["film/c"]);
        assert_eq!(report.failed[0].attempts, 3);
        assert!(report.failed[0].last_error.contains("503"));
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_stats_thread_safe() {
        use std::thread;

        let stats = Arc::new(FetchStats::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    stats.increment_attempts();
                    stats.increment_retried();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.attempts(), 400);
        assert_eq!(stats.retried(), 400);
    }

    #[test]
    fn test_snapshot_copies_counters() {
        let stats = FetchStats::new();
        stats.increment_attempts();
        stats.increment_attempts();
        stats.increment_retried();

        let copy = stats.snapshot();
        assert_eq!(copy.attempts(), 2);
        assert_eq!(copy.retried(), 1);
    }
}
