//! Structural invariants: the per-state checks that must hold after every transition, and a
//! stateful monitor for the one invariant ("stage monotonicity") that needs a trace rather than
//! a single snapshot to verify.

use std::collections::BTreeMap;

use csmi_core_state_machine::{LocalState, Stage};
use csmi_core_types::Node;

/// Whether `state`'s structural invariants hold: `locked_round <= round`; `valid_round <= round`
/// whenever `valid_value` is set (the L36 transition sets `valid_round := round` the moment a
/// current-round prevote quorum is observed, so equality is a reachable, not a violating, state);
/// `decision.is_some() implies stage == Decided`.
pub fn state_invariants_hold(state: &LocalState) -> bool {
    let locked_ok = state.locked_round <= state.round;
    let valid_ok = state.valid_value.is_none() || state.valid_round <= state.round;
    let decision_ok = state.decision.is_none() || state.stage == Stage::Decided;

    locked_ok && valid_ok && decision_ok
}

/// A violation of stage monotonicity: `process` was seen moving backwards within `round`, from
/// `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageViolation {
    pub process: Node,
    pub round: csmi_core_types::Round,
    pub from: Stage,
    pub to: Stage,
}

/// Tracks, for each process, the highest stage reached within its current round, and flags any
/// regression. A process moving to a new round resets its tracked stage, since `start_round`
/// always re-enters at [`Stage::Propose`].
#[derive(Debug, Default)]
pub struct StageMonitor {
    highest: BTreeMap<Node, (csmi_core_types::Round, Stage)>,
}

fn stage_rank(stage: Stage) -> u8 {
    match stage {
        Stage::Propose => 0,
        Stage::PreVote => 1,
        Stage::PreCommit => 2,
        Stage::Decided => 3,
    }
}

impl StageMonitor {
    /// A monitor with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state`'s current round and stage, returning a violation if this process's stage
    /// regressed within the same round it was last observed in.
    pub fn observe(&mut self, state: &LocalState) -> Option<StageViolation> {
        let process = state.process_id.clone();
        let violation = match self.highest.get(&process) {
            Some((round, stage)) if *round == state.round && stage_rank(state.stage) < stage_rank(*stage) => {
                Some(StageViolation {
                    process: process.clone(),
                    round: state.round,
                    from: *stage,
                    to: state.stage,
                })
            }
            _ => None,
        };

        self.highest.insert(process, (state.round, state.stage));
        violation
    }
}
