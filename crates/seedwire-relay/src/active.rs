//! Gauge bookkeeping for live connections and subscriptions.

#![allow(clippy::redundant_pub_crate)]

use seedwire_telemetry::Metrics;

#[derive(Clone, Copy)]
pub(crate) enum Tracked {
    Connection,
    Subscription,
}

/// Increments a gauge on creation and decrements it on drop, including when
/// the owning task is aborted.
pub(crate) struct ActiveGuard {
    metrics: Metrics,
    tracked: Tracked,
}

impl ActiveGuard {
    pub(crate) fn enter(metrics: &Metrics, tracked: Tracked) -> Self {
        match tracked {
            Tracked::Connection => metrics.inc_active_connections(),
            Tracked::Subscription => metrics.inc_active_subscriptions(),
        }
        Self {
            metrics: metrics.clone(),
            tracked,
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        match self.tracked {
            Tracked::Connection => self.metrics.dec_active_connections(),
            Tracked::Subscription => self.metrics.dec_active_subscriptions(),
        }
    }
}
