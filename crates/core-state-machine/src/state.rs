//! The state maintained by a single process.

use alloc::collections::BTreeSet;

use csmi_core_types::{Node, Round, Value};

use crate::{Message, Stage};

/// The local state of one process within the current height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalState {
    /// This process's own identity.
    pub process_id: Node,
    /// The round this process is currently at.
    pub round: Round,
    /// The stage this process occupies within `round`.
    pub stage: Stage,
    /// The value this process has decided, if any.
    pub decision: Option<Value>,
    /// The value this process is locked on, if any.
    pub locked_value: Option<Value>,
    /// The round at which `locked_value` was locked, or [`Round::NIL`] if unlocked.
    pub locked_round: Round,
    /// The most recent value this process saw a prevote quorum for.
    pub valid_value: Option<Value>,
    /// The round at which `valid_value` was last confirmed, or [`Round::NIL`].
    pub valid_round: Round,
    /// Every proposal this process has received.
    pub received_proposals: BTreeSet<Message>,
    /// Every prevote this process has received.
    pub received_prevotes: BTreeSet<Message>,
    /// Every precommit this process has received.
    pub received_precommits: BTreeSet<Message>,
    /// Latched the first time this process reaches the prevote stage in the current round;
    /// cleared the first time a prevote quorum is observed while at that stage.
    pub after_prevote_for_first_time: bool,
    /// Latched once a precommit quorum has been observed in the current round, so the
    /// corresponding rule fires at most once per round.
    pub precommit_quorum: bool,
}

impl LocalState {
    /// The state of `process_id` immediately after `start_round(0)`, as a non-proposer: round
    /// zero, propose stage, nothing locked or decided, no messages received yet.
    pub fn new(process_id: Node) -> Self {
        LocalState {
            process_id,
            round: Round::ZERO,
            stage: Stage::Propose,
            decision: None,
            locked_value: None,
            locked_round: Round::NIL,
            valid_value: None,
            valid_round: Round::NIL,
            received_proposals: BTreeSet::new(),
            received_prevotes: BTreeSet::new(),
            received_precommits: BTreeSet::new(),
            after_prevote_for_first_time: false,
            precommit_quorum: false,
        }
    }

    /// Whether this process has already recorded a decision.
    pub fn has_decided(&self) -> bool {
        self.decision.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_starts_at_round_zero_propose() {
        let state = LocalState::new(Node::new("p1"));
        assert_eq!(state.round, Round::ZERO);
        assert_eq!(state.stage, Stage::Propose);
        assert!(!state.has_decided());
        assert_eq!(state.locked_round, Round::NIL);
        assert_eq!(state.valid_round, Round::NIL);
    }
}
