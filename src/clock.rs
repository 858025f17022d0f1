//! Time sources for the scroll engine's scheduler
//!
//! A clock both reads the time and waits for it, so a driver always sleeps
//! on the same timeline the engine compares its deadlines against.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Resolve once `now()` has reached `deadline`
    async fn sleep_until(&self, deadline: Instant);
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep(deadline.saturating_duration_since(Instant::now())).await;
    }
}

/// Tokio's clock, which honours `tokio::time::pause` in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
}

/// Manually advanced clock; clones share the same time
///
/// Sleepers wake only when a clone advances past their deadline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
    advanced: Arc<Notify>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
            advanced: Arc::new(Notify::new()),
        }
    }

    pub fn advance(&self, by: Duration) {
        {
            let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
            *now += by;
        }
        self.advanced.notify_waiters();
    }

    /// Jump forward to `instant`; earlier instants are ignored
    pub fn advance_to(&self, instant: Instant) {
        {
            let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
            if instant <= *now {
                return;
            }
            *now = instant;
        }
        self.advanced.notify_waiters();
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep_until(&self, deadline: Instant) {
        loop {
            // Register before reading the time so an advance in between is not lost
            let mut advanced = std::pin::pin!(self.advanced.notified());
            advanced.as_mut().enable();
            if self.now() >= deadline {
                return;
            }
            advanced.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = clock.now();
        other.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));

        clock.advance_to(start);
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_manual_sleep_waits_for_advance() {
        let clock = ManualClock::new();
        let deadline = clock.now() + Duration::from_millis(500);
        let sleeper = {
            let clock = clock.clone();
            tokio::spawn(async move { clock.sleep_until(deadline).await })
        };

        tokio::task::yield_now().await;
        clock.advance(Duration::from_millis(200));
        tokio::task::yield_now().await;
        assert!(!sleeper.is_finished());

        clock.advance(Duration::from_millis(300));
        sleeper.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_sleeps_on_paused_time() {
        let clock = TokioClock;
        let deadline = clock.now() + Duration::from_secs(30);
        clock.sleep_until(deadline).await;
        assert!(clock.now() >= deadline);
    }
}
