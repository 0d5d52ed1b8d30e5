//! Bounded fixed-delay reconnection policy for the push channel
//!
//! Deliberately simpler than exponential backoff: the channel retries a
//! fixed number of times with a constant delay, then stays down until the
//! next run. Polling keeps working either way.

use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

/// Reconnection configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay between attempts
    pub delay: Duration,
    /// Maximum number of reconnection attempts
    pub max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

/// Raised once the attempt budget is spent
#[derive(Debug, Error)]
#[error("reconnection attempts exhausted")]
pub struct RetryExhausted;

/// Tracks attempts against a [`RetryPolicy`]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: usize,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Wait before the next reconnection attempt
    pub async fn wait(&mut self) -> Result<(), RetryExhausted> {
        self.attempt += 1;

        if self.attempt > self.policy.max_attempts {
            return Err(RetryExhausted);
        }

        debug!(
            "Waiting {}ms before reconnection attempt {}/{}",
            self.policy.delay.as_millis(),
            self.attempt,
            self.policy.max_attempts
        );

        sleep(self.policy.delay).await;
        Ok(())
    }

    /// Reset the attempt count (call after a successful connection)
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Current attempt number
    pub fn attempt(&self) -> usize {
        self.attempt
    }
}
