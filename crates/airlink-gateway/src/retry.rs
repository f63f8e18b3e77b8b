//! Bounded retry with deterministic exponential backoff.
//!
//! Wraps a fallible async operation in an explicit attempt loop. Each
//! logical operation (one status fetch, one command send) gets its own
//! fresh attempt budget; nothing is shared across operations. The backoff
//! ladder is deterministic -- `1000ms, 2000ms, 4000ms, capped at 5000ms` --
//! so resilience behavior is exactly reproducible under tokio's paused
//! test clock.

use std::time::Duration;

use crate::fault::Fault;

/// Retry budget and backoff bounds for one logical operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first. `0` means exactly one attempt.
    pub max_retries: u32,

    /// Delay before the first retry. Default: 1s.
    pub base_delay: Duration,

    /// Upper bound on backoff delay. Default: 5s.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Build a policy with the given retry budget and default delays.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Backoff delay after the failed attempt with the given 0-based index.
    ///
    /// `delay = min(base * 2^attempt, max)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

/// Run `attempt_fn`, retrying transient faults per `policy`.
///
/// On failure, `is_retryable` decides whether the fault is worth another
/// attempt; a terminal fault or an exhausted budget returns the last
/// fault unchanged. Success after a retry is reported at debug level so
/// recovered blips stay visible without alarming anyone.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    is_retryable: impl Fn(&Fault) -> bool,
    mut attempt_fn: F,
) -> Result<T, Fault>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Fault>>,
{
    let mut attempt: u32 = 0;

    loop {
        match attempt_fn().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(fault) => {
                if attempt >= policy.max_retries || !is_retryable(&fault) {
                    return Err(fault);
                }

                let delay = policy.backoff_delay(attempt);
                tracing::warn!(
                    error = %fault,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient fault, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    fn transient() -> Fault {
        Fault::ConnectionFailure {
            reason: "unreachable".into(),
        }
    }

    #[test]
    fn backoff_ladder_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(4000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(5000));
        assert_eq!(policy.backoff_delay(10), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn three_retries_take_the_exact_ladder() {
        let policy = RetryPolicy::with_retries(3);
        let attempt_times: Mutex<Vec<Instant>> = Mutex::new(Vec::new());

        let result: Result<(), Fault> = with_retry(&policy, Fault::is_transient, || {
            attempt_times.lock().unwrap().push(Instant::now());
            async { Err(transient()) }
        })
        .await;

        assert!(result.is_err());

        let times = attempt_times.lock().unwrap();
        assert_eq!(times.len(), 4, "3 retries means 4 attempts");
        assert_eq!(times[1] - times[0], Duration::from_millis(1000));
        assert_eq!(times[2] - times[1], Duration::from_millis(2000));
        assert_eq!(times[3] - times[2], Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_performs_exactly_one_attempt() {
        let policy = RetryPolicy::with_retries(0);
        let attempts = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), Fault> = with_retry(&policy, Fault::is_transient, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(Instant::now() - started, Duration::ZERO, "no backoff slept");
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_faults_are_not_retried() {
        let policy = RetryPolicy::with_retries(5);
        let attempts = AtomicU32::new(0);

        let result: Result<(), Fault> = with_retry(&policy, Fault::is_transient, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(Fault::MalformedResponse {
                    detail: "not json".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Fault::MalformedResponse { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_once_the_fault_clears() {
        let policy = RetryPolicy::with_retries(2);
        let attempts = AtomicU32::new(0);

        let result = with_retry(&policy, Fault::is_transient, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn each_operation_gets_a_fresh_budget() {
        let policy = RetryPolicy::with_retries(1);

        for _ in 0..2 {
            let attempts = AtomicU32::new(0);
            let result: Result<(), Fault> = with_retry(&policy, Fault::is_transient, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

            assert!(result.is_err());
            assert_eq!(attempts.load(Ordering::SeqCst), 2);
        }
    }
}
