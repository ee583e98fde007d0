//! Periodic stats pusher clock.

use std::future;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Cancellable fixed-period timer owned by one subscription.
///
/// An idle or cancelled ticker never completes `tick`, so it can sit in a
/// `select!` next to the worker event stream.
#[derive(Debug, Default)]
pub struct StatsTicker {
    interval: Option<Interval>,
}

impl StatsTicker {
    /// Ticker that has not been started.
    #[must_use]
    pub const fn idle() -> Self {
        Self { interval: None }
    }

    /// Start ticking every `period`, first tick one period from now.
    pub fn start(&mut self, period: Duration) {
        let period = period.max(MIN_PERIOD);
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Stop the timer. Returns `true` if it was running.
    pub fn cancel(&mut self) -> bool {
        self.interval.take().is_some()
    }

    /// Whether the timer is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => future::pending().await,
        }
    }
}
