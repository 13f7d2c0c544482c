//! Retry logic with linear backoff, ceiling and jitter
//!
//! Every request this crate sends goes through [`execute_with_retry`]. Transient
//! failures (connection errors, timeouts, retryable HTTP statuses) are repeated up to
//! `max_num_retries` times; decode failures and cancellation are returned at once.
//!
//! # Example
//!
//! ```no_run
//! use hypersync_stream::retry::execute_with_retry;
//! use hypersync_stream::config::RetryConfig;
//! use hypersync_stream::Error;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let cancel = CancellationToken::new();
//! let height = execute_with_retry(&config, &cancel, || async {
//!     // Your request here
//!     Ok::<u64, Error>(20_000_000)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, server busy, connection reset) should return `true`.
/// Permanent failures (malformed response, bad request, cancellation) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection failures, timeouts and truncated bodies
            Error::Network(_) => true,
            // Client errors with an explanatory body will fail the same way again;
            // everything else (5xx, 408, 429, empty bodies) is worth another attempt
            Error::Http { status, body } => {
                let permanent_client_error =
                    (400..500).contains(status) && *status != 408 && *status != 429;
                !(permanent_client_error && !body.trim().is_empty())
            }
            // Structural mismatch; retrying reproduces it
            Error::Decode(_) => false,
            Error::Serialization(_) => false,
            Error::Protocol(_) => false,
            Error::Config { .. } => false,
            Error::InvalidQuery(_) => false,
            Error::Cancelled => false,
            Error::RetriesExhausted { .. } => false,
            Error::AlreadyStarted => false,
            Error::Other(_) => false,
        }
    }
}

/// Execute an async operation under the retry policy
///
/// Attempts the operation up to `max_num_retries + 1` times. Both the operation and
/// the wait between attempts race against `cancel`; cancellation yields
/// [`Error::Cancelled`] rather than a retry failure.
///
/// # Returns
///
/// The first successful result, the first non-retryable error, or
/// [`Error::RetriesExhausted`] carrying the last failure.
pub async fn execute_with_retry<F, Fut, T>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let max_attempts = config.max_num_retries.saturating_add(1);
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            outcome = operation() => outcome,
        };

        let e = match outcome {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        if !e.is_retryable() {
            tracing::error!(error = %e, "Request failed with non-retryable error");
            return Err(e);
        }

        if attempt + 1 >= max_attempts {
            tracing::error!(
                error = %e,
                attempts = attempt + 1,
                "Request failed after all retry attempts exhausted"
            );
            return Err(Error::RetriesExhausted {
                attempts: attempt + 1,
                source: Box::new(e),
            });
        }

        let delay = backoff_delay(config, attempt) + jitter(config.retry_backoff_ms);

        tracing::warn!(
            error = %e,
            attempt = attempt + 1,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Request failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}

/// Deterministic part of the wait before retry `attempt` (zero-based)
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let linear = config
        .retry_backoff_ms
        .saturating_mul(u64::from(attempt))
        .saturating_add(config.retry_base_ms);
    Duration::from_millis(linear.min(config.retry_ceiling_ms))
}

/// Uniform random jitter in `[0, width_ms)` milliseconds
fn jitter(width_ms: u64) -> Duration {
    if width_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..width_ms))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> Error {
        Error::Http {
            status: 503,
            body: "service unavailable".to_string(),
        }
    }

    fn fast_config(max_num_retries: u32) -> RetryConfig {
        RetryConfig {
            max_num_retries,
            retry_base_ms: 10,
            retry_backoff_ms: 10,
            retry_ceiling_ms: 40,
        }
    }

    #[tokio::test]
    async fn test_success_no_retry() {
        let config = RetryConfig::default();
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&config, &cancel, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn test_retry_transient_then_succeed_within_backoff_bound() {
        let config = fast_config(5);
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let failures = 3;

        let start = std::time::Instant::now();
        let result = execute_with_retry(&config, &cancel, || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < failures { Err(transient()) } else { Ok(7) }
            }
        })
        .await;
        let elapsed = start.elapsed();

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), failures + 1);

        // Waits: 10 + 20 + 30 = 60ms deterministic, plus up to 3 * 10ms jitter
        let floor: Duration = (0..failures).map(|n| backoff_delay(&config, n)).sum();
        assert_eq!(floor, Duration::from_millis(60));
        assert!(
            elapsed >= floor,
            "should wait at least {floor:?}, waited {elapsed:?}"
        );
        // Generous upper bound to tolerate CI scheduling
        assert!(
            elapsed < floor + Duration::from_millis(30) + Duration::from_secs(1),
            "should not wait too long, waited {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_retries_exhausted_carries_last_error() {
        let config = fast_config(2);
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&config, &cancel, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(transient())
            }
        })
        .await;

        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "should try initial + 2 retries"
        );
        match result {
            Err(Error::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, Error::Http { status: 503, .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_error_not_retried() {
        let config = fast_config(5);
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&config, &cancel, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(Error::Decode(DecodeError::MissingField("hash")))
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Decode(_))));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            1,
            "should not retry decode error"
        );
    }

    #[tokio::test]
    async fn test_zero_retries_fails_on_first_transient_error() {
        let config = fast_config(0);
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&config, &cancel, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(transient())
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(Error::RetriesExhausted { attempts: 1, .. })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff_wait() {
        let config = RetryConfig {
            max_num_retries: 10,
            retry_base_ms: 60_000,
            retry_backoff_ms: 1,
            retry_ceiling_ms: 60_000,
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let start = std::time::Instant::now();
        let result = execute_with_retry(&config, &cancel, || async {
            Err::<i32, _>(transient())
        })
        .await;

        assert!(
            matches!(result, Err(Error::Cancelled)),
            "cancellation must not surface as retries exhausted"
        );
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_operation() {
        let config = RetryConfig::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = execute_with_retry(&config, &cancel, || async {
            std::future::pending::<Result<i32, Error>>().await
        })
        .await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_backoff_delay_is_linear_and_capped() {
        let config = RetryConfig {
            max_num_retries: 12,
            retry_base_ms: 200,
            retry_backoff_ms: 500,
            retry_ceiling_ms: 1_500,
        };

        assert_eq!(backoff_delay(&config, 0), Duration::from_millis(200));
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(700));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(1_200));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(1_500));
        assert_eq!(backoff_delay(&config, 1_000), Duration::from_millis(1_500));
    }

    #[test]
    fn jitter_stays_within_bounds_over_many_iterations() {
        for i in 0..200 {
            let j = jitter(25);
            assert!(j < Duration::from_millis(25), "iteration {i}: jitter {j:?}");
        }
        assert_eq!(jitter(0), Duration::ZERO, "zero width must not panic");
    }

    #[test]
    fn test_http_status_retry_policy() {
        let http = |status: u16, body: &str| Error::Http {
            status,
            body: body.to_string(),
        };

        assert!(http(500, "internal error").is_retryable());
        assert!(http(502, "").is_retryable());
        assert!(http(429, "slow down").is_retryable());
        assert!(http(408, "timeout").is_retryable());
        assert!(http(400, "").is_retryable(), "no body means no evidence of a permanent error");
        assert!(!http(400, "invalid query: from_block > to_block").is_retryable());
        assert!(!http(401, "unauthorized").is_retryable());
    }

    #[test]
    fn test_permanent_errors_not_retryable() {
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::Protocol("cursor went backwards".to_string()).is_retryable());
        assert!(
            !Error::Config {
                message: "bad config".to_string(),
                key: None,
            }
            .is_retryable()
        );
    }
}
