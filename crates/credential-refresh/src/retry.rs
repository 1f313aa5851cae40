//! Fixed-delay retry policy
//!
//! Retries are unbounded and the delay never grows. The policy is a value so
//! tests can run the same loops with `RetryPolicy::immediate()`.

use std::time::Duration;

/// Wait between failed credential fetch attempts.
pub const CREDENTIAL_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Constant delay between attempts, no attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    pub const fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Zero delay; for tests.
    pub const fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured delay. Yields even when the delay is zero.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(CREDENTIAL_RETRY_DELAY)
    }
}
