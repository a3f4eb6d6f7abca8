//! The "upon" rules: per-process pure transitions fired by an inbound message or an expired
//! timeout. Each returns the (possibly unchanged) next state plus the outputs it produced.
//!
//! Function names and the trailing line-number comments follow the round-trip numbering used
//! throughout the paper this model is drawn from, the same way the round state machine this
//! crate is grounded on annotates its own branches.

use alloc::vec;
use alloc::vec::Vec;

use csmi_core_types::{NilOrVal, Round, TimeoutEvent, TimeoutKind};

use crate::config::Config;
use crate::message::distinct_sources;
use crate::output::ConsensusOutput;
use crate::stage::Stage;
use crate::state::LocalState;
use crate::Message;

/// Begin `round` at `state.process_id`. Broadcasts a proposal if this process is the round's
/// proposer, otherwise schedules a propose timeout.
pub fn start_round(cfg: &Config, mut state: LocalState, round: Round) -> (LocalState, Vec<ConsensusOutput>) {
    state.round = round;
    state.stage = Stage::Propose;
    state.precommit_quorum = false;

    if cfg.proposer(round) == Some(&state.process_id) {
        let value = state.valid_value.clone().or_else(|| cfg.value_for(round).cloned());
        match value {
            Some(value) => {
                tracing::debug!(process = %state.process_id, %round, "start_round: proposing as round's proposer");
                let output = ConsensusOutput::Broadcast(Message::Propose {
                    src: state.process_id.clone(),
                    round,
                    proposal: value,
                    valid_round: state.valid_round,
                });
                (state, vec![output])
            }
            None => {
                tracing::warn!(process = %state.process_id, %round, "start_round: no configured value to propose");
                (state, vec![])
            }
        }
    } else {
        tracing::debug!(process = %state.process_id, %round, "start_round: scheduling propose timeout");
        let output = ConsensusOutput::StartTimeout(TimeoutEvent::new(TimeoutKind::Propose, round));
        (state, vec![output])
    }
}

/// Dispatch an inbound message to the handler for its kind.
pub fn receive_message(cfg: &Config, state: LocalState, msg: Message) -> (LocalState, Vec<ConsensusOutput>) {
    match msg {
        Message::Propose { .. } => receive_propose(cfg, state, msg),
        Message::PreVote { .. } => receive_prevote(cfg, state, msg),
        Message::PreCommit { .. } => receive_precommit(cfg, state, msg),
    }
}

/// Dispatch an expired timeout to the handler for its kind.
pub fn fire_timeout_event(cfg: &Config, state: LocalState, timeout: TimeoutEvent) -> (LocalState, Vec<ConsensusOutput>) {
    match timeout.kind {
        TimeoutKind::Propose => fire_propose_timeout(state, timeout.round),
        TimeoutKind::PreVote => fire_prevote_timeout(state, timeout.round),
        TimeoutKind::PreCommit => fire_precommit_timeout(cfg, state, timeout.round),
    }
}

fn receive_propose(cfg: &Config, mut state: LocalState, msg: Message) -> (LocalState, Vec<ConsensusOutput>) {
    state.received_proposals.insert(msg.clone());

    let mut outputs = Vec::new();

    let (state1, out1) = propose_at_propose_stage(cfg, state, &msg);
    state = state1;
    outputs.extend(out1);

    let (state2, out2) = propose_with_prevote_quorum_at_propose_stage(cfg, state, &msg);
    state = state2;
    outputs.extend(out2);

    let (state3, out3) = propose_with_prevote_quorum_after_propose_stage(cfg, state, &msg);
    state = state3;
    outputs.extend(out3);

    (state, outputs)
}

fn receive_prevote(cfg: &Config, mut state: LocalState, msg: Message) -> (LocalState, Vec<ConsensusOutput>) {
    state.received_prevotes.insert(msg.clone());

    let mut outputs = Vec::new();

    // L34 - prevote quorum for the first time at the prevote stage.
    let quorum_any = any_id_distinct_sources(&state.received_prevotes, state.round);
    if state.stage == Stage::PreVote && state.after_prevote_for_first_time && cfg.quorum().is_quorum(quorum_any) {
        tracing::debug!(process = %state.process_id, round = %state.round, "L34: prevote quorum at prevote stage, scheduling prevote timeout");
        state.after_prevote_for_first_time = false;
        outputs.push(ConsensusOutput::StartTimeout(TimeoutEvent::new(
            TimeoutKind::PreVote,
            msg.round(),
        )));
        for vote in state.received_prevotes.iter().filter(|v| v.round() == state.round) {
            outputs.push(ConsensusOutput::CollectEvidence(vote.clone()));
        }
    }

    // L28/L36 may now be satisfied for any previously seen proposal.
    let proposals: Vec<Message> = state.received_proposals.iter().cloned().collect();
    for proposal in proposals {
        let (next, out) = propose_with_prevote_quorum_at_propose_stage(cfg, state, &proposal);
        state = next;
        outputs.extend(out);

        let (next, out) = propose_with_prevote_quorum_after_propose_stage(cfg, state, &proposal);
        state = next;
        outputs.extend(out);
    }

    (state, outputs)
}

fn receive_precommit(cfg: &Config, mut state: LocalState, msg: Message) -> (LocalState, Vec<ConsensusOutput>) {
    state.received_precommits.insert(msg.clone());

    let mut outputs = Vec::new();

    // L47 - precommit quorum for the first time.
    let quorum_any = any_id_distinct_sources(&state.received_precommits, state.round);
    if !state.precommit_quorum && cfg.quorum().is_quorum(quorum_any) {
        tracing::debug!(process = %state.process_id, round = %state.round, "L47: precommit quorum, scheduling precommit timeout");
        state.precommit_quorum = true;
        outputs.push(ConsensusOutput::StartTimeout(TimeoutEvent::new(
            TimeoutKind::PreCommit,
            msg.round(),
        )));
        for vote in state.received_precommits.iter().filter(|v| v.round() == state.round) {
            outputs.push(ConsensusOutput::CollectEvidence(vote.clone()));
        }
    }

    // L49 - commit, re-evaluated for every proposal ever seen.
    let proposals: Vec<Message> = state.received_proposals.iter().cloned().collect();
    for proposal in proposals {
        let (next, out) = commit(cfg, state, &proposal);
        state = next;
        outputs.extend(out);
    }

    (state, outputs)
}

/// L22 - a proposal arrives at the propose stage with no proof-of-lock round.
fn propose_at_propose_stage(cfg: &Config, mut state: LocalState, msg: &Message) -> (LocalState, Vec<ConsensusOutput>) {
    let Message::Propose { src, proposal, valid_round, .. } = msg else {
        return (state, vec![]);
    };

    let guard = *valid_round == Round::NIL
        && cfg.proposer(state.round) == Some(src)
        && state.stage == Stage::Propose;

    if !guard {
        return (state, vec![]);
    }

    tracing::debug!(process = %state.process_id, round = %state.round, "L22: proposal at propose stage");

    let id = prevote_choice(cfg, &state, proposal, |locked_round, _| locked_round == Round::NIL);

    state.stage = Stage::PreVote;
    state.after_prevote_for_first_time = true;

    let outputs = vec![
        ConsensusOutput::Broadcast(Message::PreVote {
            src: state.process_id.clone(),
            round: state.round,
            id,
        }),
        ConsensusOutput::CollectEvidence(msg.clone()),
    ];

    (state, outputs)
}

/// L28 - a proposal carrying a proof-of-lock from an earlier round, backed by a quorum.
fn propose_with_prevote_quorum_at_propose_stage(
    cfg: &Config,
    mut state: LocalState,
    msg: &Message,
) -> (LocalState, Vec<ConsensusOutput>) {
    let Message::Propose { src, proposal, valid_round, .. } = msg else {
        return (state, vec![]);
    };

    let quorum_count = distinct_sources(&state.received_prevotes, *valid_round, &NilOrVal::Val(proposal.id()));

    let guard = cfg.proposer(state.round) == Some(src)
        && state.stage == Stage::Propose
        && valid_round.is_defined()
        && *valid_round < state.round
        && cfg.quorum().is_quorum(quorum_count as u32);

    if !guard {
        return (state, vec![]);
    }

    tracing::debug!(process = %state.process_id, round = %state.round, "L28: proposal with earlier-round prevote quorum");

    let id = prevote_choice(cfg, &state, proposal, |locked_round, locked_value| {
        locked_round <= *valid_round || locked_value == Some(proposal)
    });

    state.stage = Stage::PreVote;
    state.after_prevote_for_first_time = true;

    let mut outputs = vec![
        ConsensusOutput::Broadcast(Message::PreVote {
            src: state.process_id.clone(),
            round: state.round,
            id,
        }),
        ConsensusOutput::CollectEvidence(msg.clone()),
    ];
    for vote in state
        .received_prevotes
        .iter()
        .filter(|v| v.round() == *valid_round && v.vote_id() == Some(&NilOrVal::Val(proposal.id())))
    {
        outputs.push(ConsensusOutput::CollectEvidence(vote.clone()));
    }
    outputs.push(ConsensusOutput::Breakpoint);

    (state, outputs)
}

/// L36 - a prevote quorum for the current round's proposal arrives after the propose stage.
fn propose_with_prevote_quorum_after_propose_stage(
    cfg: &Config,
    mut state: LocalState,
    msg: &Message,
) -> (LocalState, Vec<ConsensusOutput>) {
    let Message::Propose { src, proposal, round, .. } = msg else {
        return (state, vec![]);
    };

    let quorum_count = distinct_sources(&state.received_prevotes, state.round, &NilOrVal::Val(proposal.id()));

    let guard = cfg.proposer(state.round) == Some(src)
        && matches!(state.stage, Stage::PreVote | Stage::PreCommit)
        && state.after_prevote_for_first_time
        && cfg.quorum().is_quorum(quorum_count as u32);

    if !guard {
        return (state, vec![]);
    }

    tracing::debug!(process = %state.process_id, round = %state.round, "L36: current-round prevote quorum for proposal");

    state.valid_value = Some(proposal.clone());
    state.valid_round = state.round;

    let mut outputs = vec![ConsensusOutput::CollectEvidence(msg.clone())];

    if state.stage == Stage::PreVote {
        state.locked_value = Some(proposal.clone());
        state.locked_round = *round;
        state.stage = Stage::PreCommit;

        outputs.push(ConsensusOutput::Broadcast(Message::PreCommit {
            src: state.process_id.clone(),
            round: state.round,
            id: NilOrVal::Val(proposal.id()),
        }));
    }

    for vote in state
        .received_prevotes
        .iter()
        .filter(|v| v.round() == state.round && v.vote_id() == Some(&NilOrVal::Val(proposal.id())))
    {
        outputs.push(ConsensusOutput::CollectEvidence(vote.clone()));
    }

    (state, outputs)
}

/// L44 - a prevote quorum for nil at the prevote stage. Defined, intentionally never called
/// from [`receive_prevote`]: the behavior it models (moving straight to a nil precommit on a
/// nil polka) is not part of the wired transition table this crate reproduces.
pub fn process_prevote_quorum_at_prevote_stage(
    cfg: &Config,
    mut state: LocalState,
    round: Round,
) -> (LocalState, Vec<ConsensusOutput>) {
    let quorum_count = distinct_sources(&state.received_prevotes, round, &NilOrVal::Nil);

    if state.stage != Stage::PreVote || !cfg.quorum().is_quorum(quorum_count as u32) {
        return (state, vec![]);
    }

    state.stage = Stage::PreCommit;
    let output = ConsensusOutput::Broadcast(Message::PreCommit {
        src: state.process_id.clone(),
        round: state.round,
        id: NilOrVal::Nil,
    });

    (state, vec![output])
}

/// L49 - decide once a precommit quorum for a valid proposal is observed.
fn commit(cfg: &Config, mut state: LocalState, proposal_msg: &Message) -> (LocalState, Vec<ConsensusOutput>) {
    let Message::Propose { src, round, proposal, .. } = proposal_msg else {
        return (state, vec![]);
    };

    let quorum_count = distinct_sources(&state.received_precommits, *round, &NilOrVal::Val(proposal.id()));

    let guard = cfg.proposer(*round) == Some(src)
        && state.decision.is_none()
        && cfg.quorum().is_quorum(quorum_count as u32);

    if !guard || !cfg.is_valid(proposal) {
        return (state, vec![]);
    }

    tracing::debug!(process = %state.process_id, round = %state.round, "L49: precommit quorum, deciding");

    state.decision = Some(proposal.clone());
    state.stage = Stage::Decided;

    let mut outputs = vec![ConsensusOutput::CollectEvidence(proposal_msg.clone())];
    for vote in state
        .received_precommits
        .iter()
        .filter(|v| v.round() == *round && v.vote_id() == Some(&NilOrVal::Val(proposal.id())))
    {
        outputs.push(ConsensusOutput::CollectEvidence(vote.clone()));
    }

    (state, outputs)
}

/// L55 - the propose timeout for the current round expired.
fn fire_propose_timeout(mut state: LocalState, round: Round) -> (LocalState, Vec<ConsensusOutput>) {
    if state.round != round || state.stage != Stage::Propose {
        return (state, vec![]);
    }

    tracing::debug!(process = %state.process_id, %round, "L55: propose timeout, prevoting nil");
    state.stage = Stage::PreVote;

    let output = ConsensusOutput::Broadcast(Message::PreVote {
        src: state.process_id.clone(),
        round,
        id: NilOrVal::Nil,
    });

    (state, vec![output])
}

/// L61 - the prevote timeout for the current round expired.
fn fire_prevote_timeout(mut state: LocalState, round: Round) -> (LocalState, Vec<ConsensusOutput>) {
    if state.round != round || state.stage != Stage::PreVote {
        return (state, vec![]);
    }

    tracing::debug!(process = %state.process_id, %round, "L61: prevote timeout, precommitting nil");
    state.stage = Stage::PreCommit;

    let output = ConsensusOutput::Broadcast(Message::PreCommit {
        src: state.process_id.clone(),
        round,
        id: NilOrVal::Nil,
    });

    (state, vec![output])
}

/// L65 - the precommit timeout for the current round expired; move to the next round
/// unconditionally (no stage guard).
fn fire_precommit_timeout(cfg: &Config, state: LocalState, round: Round) -> (LocalState, Vec<ConsensusOutput>) {
    if state.round != round {
        return (state, vec![]);
    }

    tracing::debug!(process = %state.process_id, %round, "L65: precommit timeout, skipping round");
    start_round(cfg, state, round.increment())
}

/// Count distinct prevote/precommit sources at `round`, regardless of the id voted for.
fn any_id_distinct_sources(votes: &alloc::collections::BTreeSet<Message>, round: Round) -> u32 {
    votes
        .iter()
        .filter(|m| m.round() == round)
        .map(Message::src)
        .collect::<alloc::collections::BTreeSet<_>>()
        .len() as u32
}

/// Shared prevote-value choice: vote for the proposal's id if it is valid and the
/// process-specific locking condition holds, otherwise vote nil.
fn prevote_choice(
    cfg: &Config,
    state: &LocalState,
    proposal: &csmi_core_types::Value,
    locking_condition: impl FnOnce(Round, Option<&csmi_core_types::Value>) -> bool,
) -> NilOrVal<csmi_core_types::ValueId> {
    if cfg.is_valid(proposal) && locking_condition(state.locked_round, state.locked_value.as_ref()) {
        NilOrVal::Val(proposal.id())
    } else {
        NilOrVal::Nil
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::{BTreeMap, BTreeSet};
    use csmi_core_types::{Node, Value};

    fn config() -> Config {
        let mut proposer = BTreeMap::new();
        proposer.insert(Round::new(0), Node::new("p1"));
        proposer.insert(Round::new(1), Node::new("p2"));

        let mut values = BTreeMap::new();
        values.insert(Round::new(0), Value::new("v0"));
        values.insert(Round::new(1), Value::new("v1"));

        let mut correct = BTreeSet::new();
        correct.insert(Node::new("p1"));
        correct.insert(Node::new("p2"));
        correct.insert(Node::new("p3"));

        Config::new(1, proposer, values, correct)
    }

    #[test]
    fn non_proposer_start_round_schedules_propose_timeout() {
        let cfg = config();
        let state = LocalState::new(Node::new("p2"));
        let (_, outputs) = start_round(&cfg, state, Round::ZERO);

        assert_eq!(
            outputs,
            vec![ConsensusOutput::StartTimeout(TimeoutEvent::new(TimeoutKind::Propose, Round::ZERO))]
        );
    }

    #[test]
    fn proposer_start_round_broadcasts_proposal() {
        let cfg = config();
        let state = LocalState::new(Node::new("p1"));
        let (_, outputs) = start_round(&cfg, state, Round::ZERO);

        assert_eq!(
            outputs,
            vec![ConsensusOutput::Broadcast(Message::Propose {
                src: Node::new("p1"),
                round: Round::ZERO,
                proposal: Value::new("v0"),
                valid_round: Round::NIL,
            })]
        );
    }

    #[test]
    fn receiving_proposal_at_propose_stage_prevotes_for_value() {
        let cfg = config();
        let state = LocalState::new(Node::new("p2"));
        let msg = Message::Propose {
            src: Node::new("p1"),
            round: Round::ZERO,
            proposal: Value::new("v0"),
            valid_round: Round::NIL,
        };

        let (state, outputs) = receive_message(&cfg, state, msg.clone());

        assert_eq!(state.stage, Stage::PreVote);
        assert!(state.after_prevote_for_first_time);
        assert!(outputs.contains(&ConsensusOutput::Broadcast(Message::PreVote {
            src: Node::new("p2"),
            round: Round::ZERO,
            id: NilOrVal::Val(Value::new("v0").id()),
        })));
        assert!(outputs.contains(&ConsensusOutput::CollectEvidence(msg)));
    }

    #[test]
    fn invalid_proposal_triggers_prevote_nil() {
        let cfg = config();
        let state = LocalState::new(Node::new("p2"));
        // p3's round-2 value is not configured at all, so any proposal naming it is invalid.
        let msg = Message::Propose {
            src: Node::new("p1"),
            round: Round::ZERO,
            proposal: Value::new("not-configured"),
            valid_round: Round::NIL,
        };

        let (_, outputs) = receive_message(&cfg, state, msg);

        assert!(outputs.contains(&ConsensusOutput::Broadcast(Message::PreVote {
            src: Node::new("p2"),
            round: Round::ZERO,
            id: NilOrVal::Nil,
        })));
    }

    #[test]
    fn precommit_quorum_decides() {
        let cfg = config();
        let mut state = LocalState::new(Node::new("p2"));
        let proposal = Message::Propose {
            src: Node::new("p1"),
            round: Round::ZERO,
            proposal: Value::new("v0"),
            valid_round: Round::NIL,
        };
        state.received_proposals.insert(proposal);

        for src in ["p1", "p2", "p3"] {
            let (next, _) = receive_message(
                &cfg,
                state,
                Message::PreCommit {
                    src: Node::new(src),
                    round: Round::ZERO,
                    id: NilOrVal::Val(Value::new("v0").id()),
                },
            );
            state = next;
        }

        assert_eq!(state.decision, Some(Value::new("v0")));
        assert_eq!(state.stage, Stage::Decided);
    }

    #[test]
    fn propose_timeout_outside_current_round_is_ignored() {
        let state = LocalState::new(Node::new("p2"));
        let (next, outputs) = fire_propose_timeout(state.clone(), Round::new(5));
        assert_eq!(next, state);
        assert!(outputs.is_empty());
    }
}
