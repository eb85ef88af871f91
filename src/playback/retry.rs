use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::RetryConfig;

/// Bounded exponential backoff for one stream
///
/// Delay for attempt `n` is `base_delay * 2^n`. At most one timer is pending
/// at a time; scheduling again replaces the previous timer.
#[derive(Debug)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_attempts: u32,
    attempt_count: u32,
    pending: Option<JoinHandle<()>>,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_attempts: config.max_attempts,
            attempt_count: 0,
            pending: None,
        }
    }

    pub fn next_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// `should_retry` for the current attempt count
    pub fn can_retry(&self) -> bool {
        self.should_retry(self.attempt_count)
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Arm a one-shot timer that runs `callback` after the next delay, then
    /// count the attempt. Returns the delay used.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, callback: F) -> Duration
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.next_delay(self.attempt_count);
        self.attempt_count += 1;
        self.cancel_pending();

        debug!(
            "Retry {}/{} scheduled in {:?}",
            self.attempt_count, self.max_attempts, delay
        );

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback.await;
        }));

        delay
    }

    /// Forget the pending timer without aborting it. The timer task calls
    /// this on itself before acting, so it never aborts its own task.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Zero the attempt count after a successful attach; leaves timers alone.
    pub fn reset_attempts(&mut self) {
        self.attempt_count = 0;
    }

    /// Cancel any pending timer and zero the attempt count
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.attempt_count = 0;
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}

impl Drop for RetryPolicy {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
