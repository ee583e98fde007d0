//! Window-based rate limiter for derived notifications.
//!
//! # Design
//! - The caller owns the clock: every decision takes `now`, so the limiter is
//!   deterministic under test and never spawns timers of its own.
//! - With both edges disabled a call only sends when a second call confirms it
//!   inside the window. Isolated calls are dropped.
//! - Suppressed calls are never queued.

use std::time::Duration;

use tokio::time::Instant;

/// Which edges of a window may produce a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgePolicy {
    /// Send the call that opens a window.
    pub leading: bool,
    /// Report a pending call as due once its window elapses.
    pub trailing: bool,
}

impl EdgePolicy {
    /// Both edges suppressed; the relay's policy.
    pub const NONE: Self = Self {
        leading: false,
        trailing: false,
    };
}

/// Outcome of a single [`Throttle::call_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Perform the action now.
    Send,
    /// The call opened a window and waits for confirmation.
    Armed,
    /// The call fell inside the window of a recent send.
    Suppressed,
}

impl ThrottleDecision {
    /// Whether the action should run.
    #[must_use]
    pub const fn should_send(self) -> bool {
        matches!(self, Self::Send)
    }
}

/// Per-(subscription, message kind) rate limiter.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    policy: EdgePolicy,
    last_sent: Option<Instant>,
    armed_at: Option<Instant>,
    trailing_pending: bool,
}

impl Throttle {
    /// Limiter allowing at most one send per `window`.
    #[must_use]
    pub const fn new(window: Duration, policy: EdgePolicy) -> Self {
        Self {
            window,
            policy,
            last_sent: None,
            armed_at: None,
            trailing_pending: false,
        }
    }

    /// Register a call at `now` and decide whether it sends.
    pub fn call_at(&mut self, now: Instant) -> ThrottleDecision {
        if self.within_window(self.last_sent, now) {
            if self.policy.trailing {
                self.trailing_pending = true;
            }
            return ThrottleDecision::Suppressed;
        }

        if self.within_window(self.armed_at, now) || self.policy.leading {
            self.mark_sent(now);
            return ThrottleDecision::Send;
        }

        // Nothing armed, or the armed call expired unconfirmed.
        self.armed_at = Some(now);
        ThrottleDecision::Armed
    }

    /// Whether a pending trailing call is due at `now`. Marks it sent when it is.
    ///
    /// Always `false` unless the policy enables the trailing edge.
    pub fn poll_trailing(&mut self, now: Instant) -> bool {
        if !self.policy.trailing {
            return false;
        }
        let anchor = match (self.armed_at, self.trailing_pending) {
            (Some(armed), _) => armed,
            (None, true) => match self.last_sent {
                Some(sent) => sent,
                None => return false,
            },
            (None, false) => return false,
        };
        if now.saturating_duration_since(anchor) < self.window {
            return false;
        }
        self.mark_sent(now);
        true
    }

    /// Record an unconditional send at `now`, restarting the window.
    pub fn flush_at(&mut self, now: Instant) {
        self.mark_sent(now);
    }

    fn within_window(&self, anchor: Option<Instant>, now: Instant) -> bool {
        anchor.is_some_and(|at| now.saturating_duration_since(at) < self.window)
    }

    fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
        self.armed_at = None;
        self.trailing_pending = false;
    }
}
