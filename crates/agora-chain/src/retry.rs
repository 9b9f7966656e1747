//! The one retry policy applied by every call site.
//!
//! Attempt counts, backoff schedule, and the non-retryable predicate live
//! together here instead of being re-derived ad hoc per call.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use agora_shared::constants::{CALL_MAX_ATTEMPTS, INIT_MAX_ATTEMPTS, PROBE_MAX_ATTEMPTS};

use crate::error::ChainError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every attempt.
    Fixed(Duration),
    /// `base * 2^(attempt-1)`: 1 s, 2 s, 4 s, ...
    Exponential { base: Duration },
    /// `step * attempt`: 2 s, 4 s, 6 s, ...
    Linear { step: Duration },
}

impl Backoff {
    /// Delay to sleep after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::Exponential { base } => *base * 2u32.pow(attempt.saturating_sub(1)),
            Self::Linear { step } => *step * attempt,
        }
    }
}

/// A bounded retry loop: max attempts, a backoff schedule, and the rule for
/// which errors must never be retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Per-call wrapper: 2 attempts, exponential 1 s / 2 s.
    pub fn calls() -> Self {
        Self::new(
            CALL_MAX_ATTEMPTS,
            Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        )
    }

    /// Whole-initialization wrapper: 3 attempts, exponential 1 s / 2 s / 4 s.
    pub fn initialization() -> Self {
        Self::new(
            INIT_MAX_ATTEMPTS,
            Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        )
    }

    /// Liveness-probe inner loop: 3 attempts with fixed 1 s spacing.
    pub fn probe() -> Self {
        Self::new(PROBE_MAX_ATTEMPTS, Backoff::Fixed(Duration::from_secs(1)))
    }

    /// Run `op` until it succeeds, the error is non-retryable, or attempts
    /// are exhausted. The closure receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ChainError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ChainError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    let delay = self.backoff.delay_after(attempt);
                    warn!(
                        label,
                        attempt,
                        max = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_wallet::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_schedules() {
        let exp = Backoff::Exponential {
            base: Duration::from_secs(1),
        };
        assert_eq!(exp.delay_after(1), Duration::from_secs(1));
        assert_eq!(exp.delay_after(2), Duration::from_secs(2));
        assert_eq!(exp.delay_after(3), Duration::from_secs(4));

        let lin = Backoff::Linear {
            step: Duration::from_secs(2),
        };
        assert_eq!(lin.delay_after(1), Duration::from_secs(2));
        assert_eq!(lin.delay_after(2), Duration::from_secs(4));
        assert_eq!(lin.delay_after(3), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_exhausted() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::calls()
            .run("test", |_| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(ChainError::Provider(ProviderError::Timeout)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_stops_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::initialization()
            .run("test", |_| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(ChainError::Provider(ProviderError::UserRejected)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_transient_failure() {
        let attempts = AtomicU32::new(0);
        let result = RetryPolicy::probe()
            .run("test", |attempt| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(ChainError::Provider(ProviderError::Rpc("flaky".into())))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
