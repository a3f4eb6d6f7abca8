//! Enumerates the messages a faulty process could send.
//!
//! The harness treats this as a pool of candidate messages it may inject at any step, bypassing
//! the normal buffer semantics, alongside the genuine messages correct processes broadcast.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use csmi_core_state_machine::Message;
use csmi_core_types::{NilOrVal, Node, Round, Value};

/// Enumerate every Propose, PreVote and PreCommit a faulty process could plausibly send at one
/// of the rounds currently observed across correct processes.
///
/// `Propose` ranges over `faulty × values × (rounds(values) ∪ {nil})` for the proof-of-lock
/// round; `PreVote`/`PreCommit` range over `faulty × values`. All three range over
/// `observed_rounds` for the message's own round.
pub fn generate(
    faulty: &BTreeSet<Node>,
    values: &BTreeMap<Round, Value>,
    observed_rounds: &BTreeSet<Round>,
) -> Vec<Message> {
    let mut valid_rounds: Vec<Round> = values.keys().copied().collect();
    valid_rounds.push(Round::NIL);

    let mut messages = Vec::new();

    for src in faulty {
        for &round in observed_rounds {
            for proposal in values.values() {
                for &valid_round in &valid_rounds {
                    messages.push(Message::Propose {
                        src: src.clone(),
                        round,
                        proposal: proposal.clone(),
                        valid_round,
                    });
                }
            }

            for value in values.values() {
                messages.push(Message::PreVote {
                    src: src.clone(),
                    round,
                    id: NilOrVal::Val(value.id()),
                });
                messages.push(Message::PreCommit {
                    src: src.clone(),
                    round,
                    id: NilOrVal::Val(value.id()),
                });
            }
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (BTreeSet<Node>, BTreeMap<Round, Value>, BTreeSet<Round>) {
        let mut faulty = BTreeSet::new();
        faulty.insert(Node::new("p4"));

        let mut values = BTreeMap::new();
        values.insert(Round::new(0), Value::new("v0"));
        values.insert(Round::new(1), Value::new("v1"));

        let mut observed_rounds = BTreeSet::new();
        observed_rounds.insert(Round::new(0));

        (faulty, values, observed_rounds)
    }

    #[test]
    fn generates_one_proposal_per_value_and_valid_round() {
        let (faulty, values, rounds) = sample();
        let messages = generate(&faulty, &values, &rounds);

        let proposals = messages
            .iter()
            .filter(|m| matches!(m, Message::Propose { .. }))
            .count();

        // 1 faulty src * 1 observed round * 2 values * 3 valid_round choices (0, 1, nil)
        assert_eq!(proposals, 6);
    }

    #[test]
    fn generates_votes_for_every_value() {
        let (faulty, values, rounds) = sample();
        let messages = generate(&faulty, &values, &rounds);

        let prevotes = messages.iter().filter(|m| m.is_prevote()).count();
        let precommits = messages.iter().filter(|m| m.is_precommit()).count();

        assert_eq!(prevotes, 2);
        assert_eq!(precommits, 2);
    }

    #[test]
    fn only_faulty_sources_are_generated() {
        let (faulty, values, rounds) = sample();
        let messages = generate(&faulty, &values, &rounds);

        assert!(messages.iter().all(|m| faulty.contains(m.src())));
    }
}
