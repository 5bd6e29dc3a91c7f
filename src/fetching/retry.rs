use crate::fetching::error::FetchError;
use log::{error, warn};
use std::future::Future;
use std::time::Duration;

/// Bounded retry with linear backoff.
///
/// After failed attempt `n` (counting from 1) the caller waits `n * base_delay`
/// before trying again. There is no wait after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Runs `operation` until it succeeds or `max_attempts` attempts have failed.
    ///
    /// `label` only appears in log lines.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RetriesExhausted`] wrapping the last failure.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    error!(
                        "Giving up on {} after {} attempts: {}",
                        label, attempt, e
                    );
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt, self.max_attempts, label, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
