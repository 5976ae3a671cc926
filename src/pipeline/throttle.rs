//! Fixed-delay pacing between consecutive LLM calls.
//!
//! The upstream model throttles aggressive clients, so the pipeline waits
//! `delay` before every engine call of a sweep except the first.  Time is
//! read through the [`Clock`] trait so tests can observe the pauses without
//! sleeping.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Source of delays.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay policy shared by every sweep of one pipeline.
#[derive(Clone)]
pub struct Throttle {
    delay: Duration,
    clock: Arc<dyn Clock>,
}

impl Throttle {
    pub fn new(delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { delay, clock }
    }

    /// Real-time throttle with the given pause in milliseconds.
    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms), Arc::new(TokioClock))
    }

    /// Never pauses.
    pub fn none() -> Self {
        Self::from_millis(0)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start a new sweep.
    pub fn pacer(&self) -> Pacer<'_> {
        Pacer {
            throttle: self,
            calls: 0,
        }
    }
}

/// Call counter for one sweep.
pub struct Pacer<'a> {
    throttle: &'a Throttle,
    calls: usize,
}

impl Pacer<'_> {
    /// Wait, unless this is the sweep's first call, then count the call.
    pub async fn ready(&mut self) {
        if self.calls > 0 && !self.throttle.delay.is_zero() {
            self.throttle.clock.sleep(self.throttle.delay).await;
        }
        self.calls += 1;
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::ManualClock;

    #[tokio::test]
    async fn first_call_is_not_delayed() {
        let clock = Arc::new(ManualClock::default());
        let throttle = Throttle::new(Duration::from_millis(500), clock.clone());

        let mut pacer = throttle.pacer();
        pacer.ready().await;
        assert_eq!(clock.pauses(), 0);

        pacer.ready().await;
        pacer.ready().await;
        assert_eq!(clock.pauses(), 2);
        assert_eq!(clock.elapsed(), Duration::from_millis(1000));
        assert_eq!(pacer.calls(), 3);
    }

    #[tokio::test]
    async fn each_sweep_starts_fresh() {
        let clock = Arc::new(ManualClock::default());
        let throttle = Throttle::new(Duration::from_millis(100), clock.clone());

        throttle.pacer().ready().await;
        throttle.pacer().ready().await;
        assert_eq!(clock.pauses(), 0);
    }

    #[tokio::test]
    async fn zero_delay_never_sleeps() {
        let throttle = Throttle::none();
        let mut pacer = throttle.pacer();
        pacer.ready().await;
        pacer.ready().await;
        assert_eq!(throttle.delay(), Duration::ZERO);
        assert_eq!(pacer.calls(), 2);
    }
}
