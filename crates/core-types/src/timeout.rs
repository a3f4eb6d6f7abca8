//! Timeout events scheduled by the Tendermint transitions and fired by the harness.

use crate::Round;

/// The kind of a scheduled timeout, naming the stage it guards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// Waiting for a proposal at the propose stage.
    Propose,
    /// Waiting for a prevote quorum at the prevote stage.
    PreVote,
    /// Waiting for a precommit quorum at the precommit stage.
    PreCommit,
}

impl TimeoutKind {
    /// The rank of this timeout's phase in the order `Propose < PreVote < PreCommit`,
    /// used by [`TimeoutEvent::should_replace`](crate::TimeoutEvent::should_replace).
    pub const fn phase_rank(&self) -> u8 {
        match self {
            TimeoutKind::Propose => 0,
            TimeoutKind::PreVote => 1,
            TimeoutKind::PreCommit => 2,
        }
    }
}

/// A timeout event: a kind and the round it was scheduled for.
///
/// At most one of these is active per process at a time (see [`TimeoutEvent::should_replace`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeoutEvent {
    /// The kind of timeout.
    pub kind: TimeoutKind,
    /// The round it was scheduled for.
    pub round: Round,
}

impl TimeoutEvent {
    /// Build a new timeout event.
    pub const fn new(kind: TimeoutKind, round: Round) -> Self {
        TimeoutEvent { kind, round }
    }

    /// Whether `new` should replace `old` as the single active timeout.
    ///
    /// Literal port of the source policy: replace iff `new` is in a later round, or — for the
    /// same round — has an *earlier* phase than `old` in the `Propose < PreVote < PreCommit`
    /// order. This reads backwards from what the name suggests (one would expect a later phase
    /// to win within a round) but that is the behavior the model specifies; see `DESIGN.md`.
    pub fn should_replace(old: &TimeoutEvent, new: &TimeoutEvent) -> bool {
        if new.round != old.round {
            new.round > old.round
        } else {
            new.kind.phase_rank() < old.kind.phase_rank()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_round_always_replaces() {
        let old = TimeoutEvent::new(TimeoutKind::Propose, Round::ZERO);
        let new = TimeoutEvent::new(TimeoutKind::PreVote, Round::new(1));
        assert!(TimeoutEvent::should_replace(&old, &new));
    }

    #[test]
    fn same_round_earlier_phase_replaces() {
        let old = TimeoutEvent::new(TimeoutKind::PreCommit, Round::ZERO);
        let new = TimeoutEvent::new(TimeoutKind::Propose, Round::ZERO);
        assert!(TimeoutEvent::should_replace(&old, &new));
    }

    #[test]
    fn same_round_later_phase_is_ignored() {
        let old = TimeoutEvent::new(TimeoutKind::Propose, Round::ZERO);
        let new = TimeoutEvent::new(TimeoutKind::PreCommit, Round::ZERO);
        assert!(!TimeoutEvent::should_replace(&old, &new));
    }
}
