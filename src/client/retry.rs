use std::future::Future;
use std::time::Duration;

use super::error::{ClientError, ClientResult};

/// Retry schedule for queries and mutations: exponential backoff starting at
/// `base_delay`, doubling per attempt, capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Errors for which this returns false fail immediately.
    pub retry_if: fn(&ClientError) -> bool,
}

fn always(_: &ClientError) -> bool {
    true
}

impl RetryPolicy {
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            retry_if: always,
        }
    }

    /// Mutations are not retried unless asked for.
    pub const fn none() -> Self {
        Self::new(0)
    }

    /// Queries retry three times.
    pub const fn query_default() -> Self {
        Self::new(3)
    }

    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub const fn retry_if(mut self, predicate: fn(&ClientError) -> bool) -> Self {
        self.retry_if = predicate;
        self
    }

    /// Delay before retry number `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries && (self.retry_if)(&err) => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(attempt = attempt + 1, ?delay, "Retrying after error: {}", err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn http(status: StatusCode) -> ClientError {
        ClientError::Http {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::query_default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2).with_base_delay(Duration::from_millis(1));

        let result = policy
            .run(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(http(StatusCode::INTERNAL_SERVER_ERROR))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn predicate_stops_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2)
            .with_base_delay(Duration::from_millis(1))
            .retry_if(|err| !err.is_not_found());

        let result: ClientResult<()> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(http(StatusCode::NOT_FOUND))
            })
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
