//! Retry policy for downstream calls.
//!
//! # Design Decisions
//! - Only connection failures are retried; the request never reached the
//!   service, so a retry cannot duplicate work
//! - Error statuses and timeouts are not retried; the breaker sees them instead
//! - Jittered backoff prevents thundering herd

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the next attempt, or `None` once `attempts` made so far
    /// exhausts the policy or the error is not retryable.
    pub fn next_delay(&self, attempts: u32, error: &reqwest::Error) -> Option<Duration> {
        if attempts >= self.max_attempts || !is_retryable(error) {
            return None;
        }
        Some(calculate_backoff(attempts, self.base_delay_ms, self.max_delay_ms))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

/// Connection errors are retryable; everything else is final.
pub fn is_retryable(error: &reqwest::Error) -> bool {
    error.is_connect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect_error() -> reqwest::Error {
        // Bind then drop a listener so the port is closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        reqwest::Client::new()
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_connect_errors_retry_until_exhausted() {
        let err = connect_error().await;
        assert!(is_retryable(&err));

        let policy = RetryPolicy::from(&RetryConfig {
            max_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        });
        assert!(policy.next_delay(1, &err).is_some());
        assert!(policy.next_delay(2, &err).is_some());
        assert!(policy.next_delay(3, &err).is_none());
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let err = connect_error().await;
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
        assert!(RetryPolicy::none().next_delay(1, &err).is_none());
    }
}
