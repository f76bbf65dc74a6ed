// Retry logic with exponential backoff
//
// Every provider call runs through `RetryPolicy::run`. Failed attempts wait
// base * 2^n (capped at max_delay); a 429 with Retry-After waits at least
// that long, still capped.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::RetrySettings;
use crate::errors::ProviderError;

/// Why one attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptError {
    pub reason: String,
    pub retry_after: Option<Duration>,
}

impl AttemptError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retry_after: None,
        }
    }

    pub fn rate_limited(reason: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            reason: reason.into(),
            retry_after,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts; used by tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn delay_for(&self, retry: u32, error: &AttemptError) -> Duration {
        let backoff = self.backoff(retry);
        match error.retry_after {
            Some(after) => backoff.max(after).min(self.max_delay),
            None => backoff,
        }
    }

    /// Run `f` until it succeeds or the attempt budget is spent.
    pub async fn run<F, Fut, T>(&self, provider: &str, f: F) -> Result<T, ProviderError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let attempts = self.max_attempts();
        let mut last_reason = String::new();

        for attempt in 0..attempts {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt + 1 < attempts {
                        let delay = self.delay_for(attempt, &e);
                        tracing::warn!(
                            provider,
                            error = %e.reason,
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            attempts,
                            delay
                        );
                        sleep(delay).await;
                    }
                    last_reason = e.reason;
                }
            }
        }

        Err(ProviderError::ProviderUnavailable {
            provider: provider.to_string(),
            attempts,
            reason: last_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let p = policy();
        assert_eq!(p.backoff(0), Duration::from_millis(1000));
        assert_eq!(p.backoff(1), Duration::from_millis(2000));
        assert_eq!(p.backoff(2), Duration::from_millis(4000));
        assert_eq!(p.backoff(3), Duration::from_millis(8000));
        assert_eq!(p.backoff(10), Duration::from_millis(8000));
        assert_eq!(p.backoff(40), Duration::from_millis(8000));
    }

    #[test]
    fn test_retry_after_raises_but_never_exceeds_cap() {
        let p = policy();
        let short = AttemptError::rate_limited("429", Some(Duration::from_millis(10)));
        assert_eq!(p.delay_for(0, &short), Duration::from_millis(1000));

        let longer = AttemptError::rate_limited("429", Some(Duration::from_secs(3)));
        assert_eq!(p.delay_for(0, &longer), Duration::from_secs(3));

        let huge = AttemptError::rate_limited("429", Some(Duration::from_secs(60)));
        assert_eq!(p.delay_for(0, &huge), Duration::from_millis(8000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = policy()
            .run("gemini", || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(AttemptError::new("503 Service Unavailable"))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_attempts_and_last_reason() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy()
            .run("grok", || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(AttemptError::new(format!("failure {}", n)))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ProviderError::ProviderUnavailable {
                provider,
                attempts,
                reason,
            }) => {
                assert_eq!(provider, "grok");
                assert_eq!(attempts, 3);
                assert_eq!(reason, "failure 2");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_max_attempts_saturates() {
        assert_eq!(RetryPolicy::immediate(u32::MAX).max_attempts(), u32::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_is_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), _> = RetryPolicy::immediate(0)
            .run("gemini", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(AttemptError::new("boom"))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
