//! Lifecycle snapshot a worker keeps alongside its event stream.
//!
//! # Design
//! - Workers record every event here before publishing it, so a late
//!   subscriber can subscribe first and then read the snapshot without
//!   missing a transition.
//! - `ready` and `finished` are sticky; later toggles do not clear them.

use seedwire_events::LifecycleEvent;

/// Last lifecycle stage a worker reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Created, no metadata yet.
    #[default]
    Pending,
    /// Metadata installed, pieces being verified.
    Verifying,
    /// Verification done.
    Ready,
    /// Requesting pieces from the swarm.
    Interested,
    /// Nothing left to request.
    Uninterested,
    /// Every selected piece is on disk.
    Finished,
    /// Torn down.
    Destroyed,
}

/// Point-in-time view of a worker's lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleState {
    /// Most recent stage.
    pub phase: LifecyclePhase,
    /// `ready` was published at least once.
    pub ready: bool,
    /// `finished` was published at least once.
    pub finished: bool,
}

impl LifecycleState {
    /// Fold `event` into the snapshot. `destroyed` is absorbing.
    pub const fn record(&mut self, event: LifecycleEvent) {
        if self.is_destroyed() {
            return;
        }
        self.phase = match event {
            LifecycleEvent::Verifying => LifecyclePhase::Verifying,
            LifecycleEvent::Ready => {
                self.ready = true;
                LifecyclePhase::Ready
            }
            LifecycleEvent::Interested => LifecyclePhase::Interested,
            LifecycleEvent::Uninterested => LifecyclePhase::Uninterested,
            LifecycleEvent::Finished => {
                self.finished = true;
                LifecyclePhase::Finished
            }
            LifecycleEvent::Destroyed => LifecyclePhase::Destroyed,
            LifecycleEvent::Verify { .. } => self.phase,
        };
    }

    /// Whether the worker has been torn down.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        matches!(self.phase, LifecyclePhase::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_stick_across_later_events() {
        let mut state = LifecycleState::default();
        for event in [
            LifecycleEvent::Verifying,
            LifecycleEvent::Verify { piece: 1 },
            LifecycleEvent::Ready,
            LifecycleEvent::Interested,
            LifecycleEvent::Finished,
            LifecycleEvent::Uninterested,
        ] {
            state.record(event);
        }
        assert_eq!(state.phase, LifecyclePhase::Uninterested);
        assert!(state.ready);
        assert!(state.finished);
        assert!(!state.is_destroyed());
    }

    #[test]
    fn destroyed_absorbs_later_events() {
        let mut state = LifecycleState::default();
        state.record(LifecycleEvent::Destroyed);
        state.record(LifecycleEvent::Ready);
        assert!(state.is_destroyed());
        assert!(!state.ready);
    }
}
