//! Accountability: agreement holds, or enough faulty processes exhibit detectable misbehavior
//! (equivocation or amnesia) to explain the disagreement.
//!
//! Evidence is consulted here and only here — the protocol transitions in
//! `csmi-core-state-machine` populate the evidence sets but never read them back.

use std::collections::BTreeSet;

use csmi::tendermint::TendermintLogic;
use csmi::Environment;
use csmi_core_state_machine::message::distinct_sources;
use csmi_core_state_machine::{Bookkeeping, Config, Message};
use csmi_core_types::{NilOrVal, Node, Round};

use crate::agreement::agreement_holds;

/// Whether `n` has equivocated: two distinct messages of the same kind, same round, same
/// source `n`, both present in evidence.
pub fn equivocates(bookkeeping: &Bookkeeping, n: &Node) -> bool {
    has_equivocation(&bookkeeping.evidence_propose, n)
        || has_equivocation(&bookkeeping.evidence_prevote, n)
        || has_equivocation(&bookkeeping.evidence_precommit, n)
}

fn has_equivocation(evidence: &BTreeSet<Message>, n: &Node) -> bool {
    let from_n: Vec<&Message> = evidence.iter().filter(|m| m.src() == n).collect();
    for i in 0..from_n.len() {
        for other in &from_n[i + 1..] {
            if from_n[i].round() == other.round() && from_n[i] != *other {
                return true;
            }
        }
    }
    false
}

/// Whether `n` exhibits amnesia: it proposed `v1` with `valid_round = r1` at round `r1`, later
/// proposed a distinct `v2` with `valid_round = r2` at round `r2 > r1`, and every round between
/// them saw a prevote quorum for `v2` in evidence.
///
/// Preserves the source's literal predicate (`valid_round = r1` at round `r1`) rather than the
/// textbook Tendermint amnesia definition (`valid_round < r1`) — see `DESIGN.md`.
pub fn amnesia_by(bookkeeping: &Bookkeeping, config: &Config, n: &Node) -> bool {
    let proposals: Vec<&Message> = bookkeeping
        .evidence_propose
        .iter()
        .filter(|m| m.src() == n)
        .collect();

    for first in &proposals {
        let Message::Propose {
            round: r1,
            proposal: v1,
            valid_round: vr1,
            ..
        } = first
        else {
            continue;
        };
        if *vr1 != *r1 {
            continue;
        }

        for second in &proposals {
            let Message::Propose {
                round: r2,
                proposal: v2,
                valid_round: vr2,
                ..
            } = second
            else {
                continue;
            };
            if *vr2 != *r2 || *r2 <= *r1 || v1 == v2 {
                continue;
            }
            if !config.is_valid(v1) || !config.is_valid(v2) {
                continue;
            }

            let every_intermediate_round_has_quorum = intermediate_rounds(*r1, *r2).all(|r| {
                let count = distinct_sources(&bookkeeping.evidence_prevote, r, &NilOrVal::Val(v2.id()));
                config.quorum().is_quorum(count as u32)
            });

            if every_intermediate_round_has_quorum {
                return true;
            }
        }
    }

    false
}

fn intermediate_rounds(r1: Round, r2: Round) -> impl Iterator<Item = Round> {
    let start = r1.as_i64();
    let end = r2.as_i64();
    (start..end).map(|r| Round::new(r as u32))
}

/// Whether accountability holds: either agreement among correct processes, or at least `F + 1`
/// faulty processes exhibit detectable misbehavior.
pub fn accountability_holds(
    env: &Environment<TendermintLogic>,
    config: &Config,
    faulty: &BTreeSet<Node>,
) -> bool {
    if agreement_holds(env, config) {
        return true;
    }

    let culprits = faulty
        .iter()
        .filter(|n| equivocates(&env.bookkeeping, n) || amnesia_by(&env.bookkeeping, config, n))
        .count();

    config.quorum().is_honest_threshold(culprits as u32)
}
