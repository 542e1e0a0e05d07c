//! # Retry Mechanism
//!
//! Bounded retries with exponential backoff for the upstream call. The loop
//! is an explicit state machine:
//!
//! ```text
//! Attempting --ok--------------------------------> Succeeded
//! Attempting --retryable error, attempts left----> BackingOff
//! Attempting --non-retryable or none left--------> Exhausted
//! BackingOff --delay elapsed---------------------> Attempting
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::types::ClassifiedError;

/// A trait for errors that can be retried
pub trait RetryableError {
    /// Returns true if the operation might succeed on retry
    fn is_transient(&self) -> bool;
}

impl RetryableError for ClassifiedError {
    fn is_transient(&self) -> bool {
        self.retryable
    }
}

/// Current position of a retry run
#[derive(Debug)]
pub enum RetryState<T, E> {
    /// About to run the operation; `attempt` counts from 0
    Attempting { attempt: u32 },
    /// Waiting before the next attempt
    BackingOff { attempt: u32, delay: Duration },
    /// The operation produced a value
    Succeeded(T),
    /// No further attempts will be made
    Exhausted(E),
}

/// Retry policy for a single idempotent operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
}

impl Default for RetryPolicy {
    /// Two retries (three attempts), starting at one second
    fn default() -> Self {
        Self::new(2, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Total attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry_index` (0 for the first retry)
    pub fn backoff_for(&self, retry_index: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_index).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempts
    /// are used up. The last error is returned unchanged.
    pub async fn execute<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + fmt::Display,
    {
        let mut state = RetryState::Attempting { attempt: 0 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => match operation().await {
                    Ok(value) => {
                        if attempt > 0 {
                            info!(
                                operation = %operation_name,
                                attempts = attempt + 1,
                                "Operation succeeded after retries"
                            );
                        }
                        RetryState::Succeeded(value)
                    }
                    Err(error) if !error.is_transient() => {
                        debug!(
                            operation = %operation_name,
                            attempt = attempt + 1,
                            error = %error,
                            "Non-retryable failure"
                        );
                        RetryState::Exhausted(error)
                    }
                    Err(error) if attempt >= self.max_retries => {
                        warn!(
                            operation = %operation_name,
                            attempts = attempt + 1,
                            error = %error,
                            "All attempts failed"
                        );
                        RetryState::Exhausted(error)
                    }
                    Err(error) => {
                        let delay = self.backoff_for(attempt);
                        info!(
                            operation = %operation_name,
                            attempt = attempt + 1,
                            backoff_ms = delay.as_millis() as u64,
                            error = %error,
                            "Attempt failed, retrying"
                        );
                        RetryState::BackingOff { attempt, delay }
                    }
                },
                RetryState::BackingOff { attempt, delay } => {
                    sleep(delay).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Succeeded(value) => return Ok(value),
                RetryState::Exhausted(error) => return Err(error),
            };
        }
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryPolicy(max_retries={}, initial_delay={:?})",
            self.max_retries, self.initial_delay
        )
    }
}

/// Helper to retry an operation with an ad-hoc policy
pub async fn execute_with_retry<F, Fut, T, E>(
    operation: F,
    max_retries: u32,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + fmt::Display,
{
    RetryPolicy::new(max_retries, initial_delay)
        .execute("operation", operation)
        .await
}
