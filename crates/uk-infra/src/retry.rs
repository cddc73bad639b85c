use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Fixed-delay retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause between consecutive attempts. Not applied after the last one.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Returned when every attempt failed.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    /// Error from the final attempt.
    pub last: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempts: {}", self.attempts, self.last)
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// Attempts are strictly sequential: the next one starts only after the
/// previous future resolved and the delay elapsed.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(last) if attempt >= attempts => {
                return Err(RetryError { attempts: attempt, last });
            }
            Err(e) => {
                tracing::debug!(attempt, max_attempts = attempts, error = %e, "attempt failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}
