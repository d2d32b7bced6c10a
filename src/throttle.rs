//! Pacing between consecutive chat-completion calls.
//!
//! The batch loop asks its [`Throttle`] to pause between two classifier calls.
//! The default policy is a flat delay; it is a courtesy to the endpoint, not a
//! rate limiter, and there is no backoff.

use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

/// Decides how long to wait before the next outbound request.
pub trait Throttle {
    async fn pause(&self);
}

/// Sleep for the same duration every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Throttle for FixedDelay {
    async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        trace!(delay_ms = self.delay.as_millis() as u64, "Throttling");
        sleep(self.delay).await;
    }
}
