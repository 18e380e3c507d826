//! Retry policy shared by the provider clients
//!
//! Exponential backoff (`base * 2^retry`, capped), a per-attempt timeout and
//! an overall wall-clock budget. Which errors are worth retrying is decided
//! by the caller through a predicate, so the policy itself carries no state
//! between calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

/// Backoff and timeout limits for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
    /// Deadline for all attempts and backoff sleeps together
    pub total_budget: Duration,
}

/// Why a retried operation gave up
#[derive(Debug, PartialEq)]
pub enum RetryError<E> {
    /// The operation failed with an error the predicate does not retry
    Rejected { error: E, attempts: u32 },
    /// Every attempt failed transiently. `last` is `None` when the final
    /// attempt hit the per-attempt timeout.
    Exhausted { last: Option<E>, attempts: u32 },
    /// The overall budget ran out mid-flight
    BudgetExceeded { attempts: u32 },
}

impl<E> RetryError<E> {
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Rejected { attempts, .. }
            | RetryError::Exhausted { attempts, .. }
            | RetryError::BudgetExceeded { attempts } => *attempts,
        }
    }
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Rejected { error, attempts } => {
                write!(f, "rejected after {attempts} attempt(s): {error}")
            }
            RetryError::Exhausted {
                last: Some(error),
                attempts,
            } => write!(f, "gave up after {attempts} attempt(s): {error}"),
            RetryError::Exhausted { last: None, attempts } => {
                write!(f, "gave up after {attempts} attempt(s): attempt timed out")
            }
            RetryError::BudgetExceeded { attempts } => {
                write!(f, "time budget exceeded after {attempts} attempt(s)")
            }
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0 for the wait after the first attempt)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry))
            .min(self.max_delay)
    }

    /// Run `attempt_fn` until it succeeds, fails permanently, runs out of
    /// attempts or the total budget elapses.
    ///
    /// `attempt_fn` receives the 1-based attempt number. Attempts that hit
    /// the per-attempt timeout are always treated as transient.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        operation: &str,
        is_transient: P,
        mut attempt_fn: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let started = Instant::now();
        let mut attempts = 0;

        let outcome = timeout(
            self.total_budget,
            self.attempt_loop(operation, &is_transient, &mut attempt_fn, &mut attempts),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} exceeded its {:.1}s budget after {} attempt(s)",
                    operation,
                    started.elapsed().as_secs_f64(),
                    attempts
                );
                Err(RetryError::BudgetExceeded { attempts })
            }
        }
    }

    async fn attempt_loop<T, E, F, Fut, P>(
        &self,
        operation: &str,
        is_transient: &P,
        attempt_fn: &mut F,
        attempts: &mut u32,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        loop {
            *attempts += 1;
            let attempt = *attempts;
            debug!(
                "{} attempt {}/{}",
                operation, attempt, self.max_attempts
            );

            let last = match timeout(self.attempt_timeout, attempt_fn(attempt)).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        info!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Ok(Err(error)) if !is_transient(&error) => {
                    debug!("{} failed permanently: {}", operation, error);
                    return Err(RetryError::Rejected {
                        error,
                        attempts: attempt,
                    });
                }
                Ok(Err(error)) => {
                    warn!("{} attempt {} failed: {}", operation, attempt, error);
                    Some(error)
                }
                Err(_) => {
                    warn!(
                        "{} attempt {} timed out after {:.1}s",
                        operation,
                        attempt,
                        self.attempt_timeout.as_secs_f64()
                    );
                    None
                }
            };

            if attempt >= self.max_attempts {
                return Err(RetryError::Exhausted {
                    last,
                    attempts: attempt,
                });
            }

            let backoff = self.delay_for(attempt - 1);
            debug!("Exponential backoff: waiting {:.3}s", backoff.as_secs_f64());
            sleep(backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            attempt_timeout: Duration::from_secs(1),
            total_budget: Duration::from_secs(60),
        }
    }

    fn is_transient(error: &TestError) -> bool {
        *error == TestError::Transient
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        let policy = RetryPolicy {
            max_delay: Duration::from_millis(350),
            ..policy()
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for(40), Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures_with_increasing_delays() {
        let failures = 2;
        let mut started_at = Vec::new();

        let result = policy()
            .run("test", is_transient, |attempt| {
                started_at.push(Instant::now());
                async move {
                    if attempt <= failures {
                        Err(TestError::Transient)
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(failures + 1));
        assert_eq!(started_at.len(), (failures + 1) as usize);

        let gaps: Vec<Duration> = started_at.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps, vec![Duration::from_millis(100), Duration::from_millis(200)]);
        assert!(gaps.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = policy()
            .run("test", is_transient, |_| {
                calls += 1;
                async { Err(TestError::Permanent) }
            })
            .await;

        assert_eq!(calls, 1);
        assert_eq!(
            result,
            Err(RetryError::Rejected {
                error: TestError::Permanent,
                attempts: 1
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = policy()
            .run("test", is_transient, |_| {
                calls += 1;
                async { Err(TestError::Transient) }
            })
            .await;

        assert_eq!(calls, 3);
        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                last: Some(TestError::Transient),
                attempts: 3
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out_and_is_retried() {
        let result = policy()
            .run("test", is_transient, |attempt| async move {
                if attempt == 1 {
                    sleep(Duration::from_secs(30)).await;
                }
                Ok::<_, TestError>(attempt)
            })
            .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_budget_is_enforced_independently_of_attempts() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            total_budget: Duration::from_millis(2500),
            ..policy()
        };
        let started = Instant::now();

        let result: Result<(), _> = policy
            .run("test", is_transient, |_| async { Err(TestError::Transient) })
            .await;

        // attempts start at t=0s, t=1s and t=3s; the budget fires at 2.5s
        assert_eq!(result, Err(RetryError::BudgetExceeded { attempts: 2 }));
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
    }
}
