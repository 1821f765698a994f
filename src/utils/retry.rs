// Retry with exponential backoff

use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one; values below 1 behave like 1
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            base_delay: Duration::from_secs(1),
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.min(5))
    }
}

pub async fn with_retry<F, T, E>(mut operation: F, policy: RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> futures::future::BoxFuture<'static, Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                attempt += 1;
                if attempt >= policy.max_attempts.max(1) {
                    return Err(error);
                }

                let delay = policy.delay(attempt - 1);
                warn!(attempt, error = %error, delay_ms = delay.as_millis() as u64, "Retrying after failure");
                sleep(delay).await;
            }
        }
    }
}
