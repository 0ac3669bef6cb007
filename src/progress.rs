//! Progress bar for fetch runs.

use indicatif::{ProgressBar, ProgressStyle};
use lbxd::Fetcher;

/// Builds a bar sized to `total` targets, or `None` when `enabled` is false.
pub(crate) fn fetch_progress_bar(enabled: bool, total: usize) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new(to_position(total));
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} targets ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    Some(bar)
}

/// Moves `bar` forward on every resolved target, not only on log intervals.
pub(crate) fn track_fetch(fetcher: Fetcher, bar: Option<&ProgressBar>) -> Fetcher {
    match bar {
        Some(bar) => {
            let bar = bar.clone();
            fetcher.with_completion(move |processed| bar.set_position(to_position(processed)))
        }
        None => fetcher,
    }
}

pub(crate) fn to_position(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use lbxd::{ApiError, FetchOptions, RequestIssuer};
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_fetch_progress_bar_disabled_returns_none() {
        assert!(fetch_progress_bar(false, 10).is_none());
    }

    #[test]
    fn test_fetch_progress_bar_enabled_uses_total_as_length() {
        let bar = fetch_progress_bar(true, 42).unwrap();
        assert_eq!(bar.length(), Some(42));
        bar.set_position(to_position(7));
        assert_eq!(bar.position(), 7);
        bar.finish_and_clear();
    }

    struct EchoIssuer;

    #[async_trait]
    impl RequestIssuer for EchoIssuer {
        async fn issue(&self, target: &str) -> Result<Value, ApiError> {
            Ok(json!({ "target": target }))
        }
    }

    #[tokio::test]
    async fn test_track_fetch_advances_bar_between_log_intervals() {
        let bar = fetch_progress_bar(true, 5).unwrap();
        let fetcher = Fetcher::new(FetchOptions {
            max_retries: 0,
            max_workers: 2,
            progress_interval: 100,
        })
        .unwrap();
        let fetcher = track_fetch(fetcher, Some(&bar));

        let report = fetcher
            .fetch_all(Arc::new(EchoIssuer), (0..5).map(|i| format!("film/{i}")))
            .await
            .unwrap();

        assert_eq!(report.successes.len(), 5);
        assert_eq!(bar.position(), 5);
        bar.finish_and_clear();
    }

    #[test]
    fn test_track_fetch_without_bar_keeps_fetcher() {
        let fetcher = Fetcher::new(FetchOptions::default()).unwrap();
        let _fetcher = track_fetch(fetcher, None);
    }
}
