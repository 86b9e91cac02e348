//! Retry logic for transport failures
//!
//! Only `PublishError::Transport` is retried. HTTP error responses and job
//! outcomes are final. The pause between attempts goes through the injected
//! `Sleeper` so tests do not wait.

use crate::core::error::PublishError;
use crate::core::traits::Sleeper;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Options for retry behavior
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::from_secs(1),
        }
    }
}

/// Retry manager for remote calls
pub struct RetryManager<'a> {
    options: RetryOptions,
    sleeper: &'a dyn Sleeper,
}

impl<'a> RetryManager<'a> {
    pub fn new(options: RetryOptions, sleeper: &'a dyn Sleeper) -> Self {
        Self { options, sleeper }
    }

    /// Execute the given async operation, retrying transport failures
    pub async fn retry<F, Fut, T>(&self, mut operation: F) -> Result<T, PublishError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PublishError>>,
    {
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    warn!(attempt, max_attempts, %error, "transport failure, retrying");
                    self.sleeper.sleep(self.options.delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
