//! Transition table for a (connection, worker) subscription.
//!
//! # Design
//! - `dispatch` is pure: it maps the current phase and one input to the next
//!   phase plus the side effects the driver must run, in order.
//! - Installation is a transition out of `AwaitingMetadata`, so it can only
//!   happen once per subscription.
//! - `Closed` absorbs every input.

use seedwire_events::LifecycleEvent;

/// Subscription lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Worker has no metadata yet; waiting for `verifying`.
    AwaitingMetadata,
    /// Listeners attached and the stats timer running.
    Installed {
        /// `ready` already relayed.
        ready_sent: bool,
        /// `finished` already relayed.
        finished_sent: bool,
    },
    /// Terminal. No further sends.
    Closed,
}

impl Phase {
    const FRESH: Self = Self::Installed {
        ready_sent: false,
        finished_sent: false,
    };

    /// Whether the subscription has stopped.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Stimulus fed to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Metadata was already present when the subscription started.
    MetadataPresent,
    /// The worker published a lifecycle event.
    Worker(LifecycleEvent),
    /// The stats timer fired.
    Tick,
}

/// Status message kinds the driver builds from worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// `verifying` with stats.
    Verifying,
    /// `ready` with stats.
    Ready,
    /// `interested`.
    Interested,
    /// `uninterested`.
    Uninterested,
    /// Periodic `stats`.
    Stats,
    /// `finished`.
    Finished,
    /// `destroyed`.
    Destroyed,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send a status message.
    Send(Notice),
    /// Offer a selection notification to its throttle.
    RequestSelection,
    /// Offer a progress notification to its throttle.
    RequestProgress,
    /// Send a selection notification bypassing the throttle.
    FlushSelection,
    /// Send a progress notification bypassing the throttle.
    FlushProgress,
    /// Start the stats timer.
    StartTimer,
    /// Cancel the stats timer.
    CancelTimer,
}

/// Result of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Phase after the input.
    pub next: Phase,
    /// Effects to run, in order.
    pub actions: &'static [Action],
}

const INSTALL: &[Action] = &[Action::Send(Notice::Verifying), Action::StartTimer];
const READY: &[Action] = &[Action::Send(Notice::Ready)];
const INTERESTED: &[Action] = &[Action::Send(Notice::Interested), Action::RequestSelection];
const UNINTERESTED: &[Action] = &[Action::Send(Notice::Uninterested), Action::RequestSelection];
const VERIFY: &[Action] = &[Action::RequestProgress];
const TICK: &[Action] = &[Action::Send(Notice::Stats), Action::RequestSelection];
const FINISHED: &[Action] = &[
    Action::Send(Notice::Finished),
    Action::FlushSelection,
    Action::FlushProgress,
];
const DESTROYED: &[Action] = &[Action::CancelTimer, Action::Send(Notice::Destroyed)];
const NOTHING: &[Action] = &[];

/// Apply `input` to `phase`.
#[must_use]
pub const fn dispatch(phase: Phase, input: Input) -> Transition {
    use LifecycleEvent as Event;

    match (phase, input) {
        (Phase::Closed, _) => stay(phase),

        (
            Phase::AwaitingMetadata,
            Input::MetadataPresent | Input::Worker(Event::Verifying),
        ) => go(Phase::FRESH, INSTALL),
        (Phase::AwaitingMetadata, Input::Worker(Event::Destroyed)) => go(Phase::Closed, NOTHING),
        (Phase::AwaitingMetadata, _) => stay(phase),

        (Phase::Installed { .. }, Input::Worker(Event::Destroyed)) => {
            go(Phase::Closed, DESTROYED)
        }
        (
            Phase::Installed {
                ready_sent: false,
                finished_sent,
            },
            Input::Worker(Event::Ready),
        ) => go(
            Phase::Installed {
                ready_sent: true,
                finished_sent,
            },
            READY,
        ),
        (
            Phase::Installed {
                ready_sent,
                finished_sent: false,
            },
            Input::Worker(Event::Finished),
        ) => go(
            Phase::Installed {
                ready_sent,
                finished_sent: true,
            },
            FINISHED,
        ),
        (Phase::Installed { .. }, Input::Worker(Event::Interested)) => go(phase, INTERESTED),
        (Phase::Installed { .. }, Input::Worker(Event::Uninterested)) => go(phase, UNINTERESTED),
        (Phase::Installed { .. }, Input::Worker(Event::Verify { .. })) => go(phase, VERIFY),
        (Phase::Installed { .. }, Input::Tick) => go(phase, TICK),
        (
            Phase::Installed { .. },
            Input::MetadataPresent
            | Input::Worker(Event::Verifying | Event::Ready | Event::Finished),
        ) => stay(phase),
    }
}

const fn go(next: Phase, actions: &'static [Action]) -> Transition {
    Transition { next, actions }
}

const fn stay(phase: Phase) -> Transition {
    go(phase, NOTHING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(inputs: &[Input]) -> (Phase, Vec<Action>) {
        let mut phase = Phase::AwaitingMetadata;
        let mut actions = Vec::new();
        for input in inputs {
            let transition = dispatch(phase, *input);
            phase = transition.next;
            actions.extend_from_slice(transition.actions);
        }
        (phase, actions)
    }

    fn sends(actions: &[Action]) -> Vec<Notice> {
        actions
            .iter()
            .filter_map(|action| match action {
                Action::Send(notice) => Some(*notice),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn installs_immediately_when_metadata_is_present() {
        let (phase, actions) = run(&[Input::MetadataPresent]);
        assert_eq!(phase, Phase::FRESH);
        assert_eq!(actions, INSTALL);
    }

    #[test]
    fn deferred_install_waits_for_verifying() {
        let (phase, actions) = run(&[
            Input::Worker(LifecycleEvent::Interested),
            Input::Tick,
            Input::Worker(LifecycleEvent::Verify { piece: 0 }),
        ]);
        assert_eq!(phase, Phase::AwaitingMetadata);
        assert!(actions.is_empty());

        let (phase, actions) = run(&[Input::Worker(LifecycleEvent::Verifying)]);
        assert_eq!(phase, Phase::FRESH);
        assert_eq!(actions, INSTALL);
    }

    #[test]
    fn installation_happens_once() {
        let (_, actions) = run(&[
            Input::MetadataPresent,
            Input::Worker(LifecycleEvent::Verifying),
            Input::MetadataPresent,
        ]);
        assert_eq!(sends(&actions), vec![Notice::Verifying]);
        let timers = actions
            .iter()
            .filter(|action| **action == Action::StartTimer)
            .count();
        assert_eq!(timers, 1);
    }

    #[test]
    fn ready_and_finished_are_relayed_once() {
        let (_, actions) = run(&[
            Input::MetadataPresent,
            Input::Worker(LifecycleEvent::Ready),
            Input::Worker(LifecycleEvent::Ready),
            Input::Worker(LifecycleEvent::Finished),
            Input::Worker(LifecycleEvent::Finished),
        ]);
        assert_eq!(
            sends(&actions),
            vec![Notice::Verifying, Notice::Ready, Notice::Finished]
        );
        assert!(actions.ends_with(&[Action::FlushSelection, Action::FlushProgress]));
    }

    #[test]
    fn interest_toggles_request_selection_every_time() {
        let (_, actions) = run(&[
            Input::MetadataPresent,
            Input::Worker(LifecycleEvent::Interested),
            Input::Worker(LifecycleEvent::Uninterested),
            Input::Worker(LifecycleEvent::Interested),
        ]);
        let requests = actions
            .iter()
            .filter(|action| **action == Action::RequestSelection)
            .count();
        assert_eq!(requests, 3);
    }

    #[test]
    fn destroyed_cancels_timer_before_final_send_and_absorbs_input() {
        let (phase, actions) = run(&[
            Input::MetadataPresent,
            Input::Tick,
            Input::Worker(LifecycleEvent::Destroyed),
            Input::Tick,
            Input::Worker(LifecycleEvent::Ready),
        ]);
        assert!(phase.is_closed());
        assert_eq!(
            &actions[actions.len() - 2..],
            &[Action::CancelTimer, Action::Send(Notice::Destroyed)]
        );
        assert_eq!(sends(&actions).last(), Some(&Notice::Destroyed));
    }

    #[test]
    fn destroyed_before_install_closes_silently() {
        let (phase, actions) = run(&[Input::Worker(LifecycleEvent::Destroyed)]);
        assert!(phase.is_closed());
        assert!(actions.is_empty());
    }
}
