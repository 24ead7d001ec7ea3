use std::{fmt::Display, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::error::StakingError;

/// Exponential backoff without jitter.
///
/// Failure-agnostic: every error is retried, it is up to the caller to only
/// wrap operations which are safe to repeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("retry cancelled")]
    Cancelled,

    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: E },
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::new(3, Duration::from_millis(1000)) }
}

impl RetryPolicy {
    /// Policy with the given total number of attempts (at least one).
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    pub fn max_attempts(&self) -> u32 { self.max_attempts }

    pub fn base_delay(&self) -> Duration { self.base_delay }

    /// Delay to wait after the given zero-based failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }

    /// Runs `operation` until it succeeds or `max_attempts` are used up.
    ///
    /// Waits `base_delay * 2^attempt` between attempts with the provided
    /// `sleep`, no delay follows the final attempt. Cancelling `cancel` aborts
    /// both the pending attempt and the pending delay.
    pub async fn run<T, E, Op, OpFut, S, SFut>(
        &self,
        mut operation: Op,
        sleep: S,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        E: Display,
        Op: FnMut() -> OpFut,
        OpFut: Future<Output = Result<T, E>>,
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let mut attempt = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                result = operation() => result,
            };
            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            attempt += 1;
            tracing::warn!(attempt, max_attempts = self.max_attempts, "attempt failed: {err}");
            if attempt >= self.max_attempts {
                return Err(RetryError::Exhausted { attempts: attempt, last: err });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = sleep(self.delay(attempt - 1)) => (),
            }
        }
    }
}

impl<E> RetryError<E> {
    /// The last failure, if the attempts were exhausted.
    pub fn into_last(self) -> Option<E> {
        match self {
            RetryError::Cancelled => None,
            RetryError::Exhausted { last, .. } => Some(last),
        }
    }
}

impl From<RetryError<StakingError>> for StakingError {
    fn from(err: RetryError<StakingError>) -> Self {
        err.into_last().unwrap_or(StakingError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let delays = Mutex::new(Vec::new());
        let mut calls = 0;

        let result = policy
            .run(
                || {
                    calls += 1;
                    let n = calls;
                    async move { if n < 3 { Err(format!("failure #{n}")) } else { Ok(n) } }
                },
                |d| {
                    delays.lock().unwrap().push(d);
                    async {}
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(
            *delays.lock().unwrap(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_failure() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let delays = Mutex::new(Vec::new());
        let mut calls = 0;

        let result: Result<(), _> = policy
            .run(
                || {
                    calls += 1;
                    let n = calls;
                    async move { Err(format!("failure #{n}")) }
                },
                |d| {
                    delays.lock().unwrap().push(d);
                    async {}
                },
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "failure #3");
            },
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(delays.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_delay() {
        let policy = RetryPolicy::new(5, Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result: Result<(), RetryError<&str>> = policy
            .run(
                || async { Err("down") },
                |_| futures::future::pending::<()>(),
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
    }

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
