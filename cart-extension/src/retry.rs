//! Bounded retry with a fixed delay between attempts.
//!
//! Attempts run strictly one after another. The delay is applied only between
//! two attempts, never after the last one, so an operation that always fails
//! costs `max_attempts` calls and `max_attempts - 1` delays.

use crate::errors::RetriesExhausted;
use std::future::Future;
use std::time::Duration;

/// How often and how far apart an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// A zero `max_attempts` is clamped to a single attempt.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Suspends the current task for at least `duration`.
pub async fn wait(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Runs `operation` until it succeeds or the policy's attempts are used up.
///
/// The closure receives the 1-based attempt number. It is expected to reuse the
/// same captured input on every call.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetriesExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                wait(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(RetriesExhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}
