//! Bounded retry with fixed backoff for the slot-reservation call.

use std::future::Future;
use std::time::Duration;

use crate::error::SagaError;

/// Retry policy for the reservation executor.
///
/// Injected rather than read from a module constant so callers can
/// override it per deployment and tests can run it under a paused
/// clock.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first call.
    pub max_attempts: u32,
    /// Fixed delay between attempts. No exponential backoff.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 2 seconds apart.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of a single attempt, as classified by the caller.
///
/// Only transient failures consume the attempt budget; a fatal error
/// short-circuits the loop immediately.
#[derive(Debug)]
pub enum AttemptError {
    /// Worth retrying: transport failure or 5xx.
    Transient(String),
    /// Retrying cannot help: business rejection or malformed payload.
    Fatal(SagaError),
}

/// Runs `call` until it succeeds, a fatal error is returned, or the
/// attempt budget is exhausted, sleeping `policy.delay` between
/// transient failures. The sleep is a plain `tokio::time::sleep`, so
/// dropping the future mid-delay cancels the remaining budget.
///
/// Exhaustion yields [`SagaError::ReservationFailed`] carrying the
/// last transient error.
pub(crate) async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut call: F,
) -> Result<T, SagaError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut last_error = String::new();

    for attempt in 1..=policy.max_attempts {
        match call(attempt).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Transient(msg)) => {
                tracing::warn!(attempt, error = %msg, "transient reservation failure");
                last_error = msg;
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(SagaError::ReservationFailed {
        attempts: policy.max_attempts,
        last_error,
    })
}
