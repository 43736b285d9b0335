//! Retry scheduling with exponential backoff
//!
//! Retries are scheduled tasks behind a cancellation token, not recursive
//! timer chaining: the scheduler spawns a delay task that either fires a
//! [`RetryFired`] message or gets cancelled, and a fresh token per schedule
//! makes cancellation race-free against an in-flight timer.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default attempt cap per play session
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay for the backoff curve
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Backoff parameters: delay for attempt `n` is `base * 2^n`
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from the `player.max_retries` and
    /// `player.retry_base_ms` configuration keys
    pub fn from_config(config: &wgconfig::Config) -> Self {
        RetryPolicy {
            max_attempts: config.get_max_retries() as u32,
            base_delay: Duration::from_millis(config.get_retry_base_ms()),
        }
    }

    /// Delay before re-attempting, doubling per consumed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// A scheduled retry that came due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFired {
    pub track_id: String,
    /// 1-indexed attempt number
    pub attempt: u32,
}

/// Schedules cancellable retry timers
///
/// At most one retry is pending at a time; scheduling a new one cancels
/// the previous timer.
#[derive(Debug)]
pub struct RetryScheduler {
    tx: mpsc::UnboundedSender<RetryFired>,
    pending: CancellationToken,
}

impl RetryScheduler {
    /// Create a scheduler and the receiver its retries fire on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RetryFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = RetryScheduler {
            tx,
            pending: CancellationToken::new(),
        };
        (scheduler, rx)
    }

    /// Schedule a retry to fire after `delay`, superseding any pending one
    pub fn schedule(&mut self, track_id: &str, attempt: u32, delay: Duration) {
        self.cancel_pending();

        let token = self.pending.clone();
        let tx = self.tx.clone();
        let fired = RetryFired {
            track_id: track_id.to_string(),
            attempt,
        };

        debug!(track_id = %fired.track_id, attempt, delay_ms = delay.as_millis() as u64, "Retry scheduled");
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(track_id = %fired.track_id, "Pending retry cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    // Receiver gone means the controller is shutting down
                    let _ = tx.send(fired);
                }
            }
        });
    }

    /// Cancel any pending retry timer; safe to call repeatedly
    pub fn cancel_pending(&mut self) {
        self.pending.cancel();
        self.pending = CancellationToken::new();
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.pending.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, Instant};

    #[test]
    fn policy_reads_the_player_config_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "player:\n  max_retries: 3\n  retry_base_ms: 250\n",
        )
        .unwrap();

        let config = wgconfig::Config::load_config(dir.path().to_str().unwrap()).unwrap();
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(16000));
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_retry_fires_after_the_delay() {
        let (mut scheduler, mut rx) = RetryScheduler::new();
        let start = Instant::now();

        scheduler.schedule("tr1", 1, Duration::from_secs(2));
        let fired = rx.recv().await.unwrap();

        assert_eq!(fired, RetryFired { track_id: "tr1".to_string(), attempt: 1 });
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_retry_from_firing() {
        let (mut scheduler, mut rx) = RetryScheduler::new();

        scheduler.schedule("tr1", 1, Duration::from_secs(2));
        scheduler.cancel_pending();
        // Idempotent
        scheduler.cancel_pending();

        advance(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_supersedes_the_pending_retry() {
        let (mut scheduler, mut rx) = RetryScheduler::new();

        scheduler.schedule("stale", 1, Duration::from_secs(1));
        scheduler.schedule("fresh", 2, Duration::from_secs(1));

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.track_id, "fresh");
        assert_eq!(fired.attempt, 2);

        advance(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
