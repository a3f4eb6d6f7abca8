//! The three message kinds a process sends and receives.

use alloc::collections::BTreeSet;

use csmi_core_types::{NilOrVal, Node, Round, Value, ValueId};

/// A message exchanged between processes, or examined as evidence.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Message {
    /// A proposal for `round`, carrying the round it was last seen valid at (`valid_round`),
    /// or `Round::NIL` if this is the first proposal for a value at this round.
    Propose {
        /// The process that sent this message.
        src: Node,
        /// The round this proposal is for.
        round: Round,
        /// The proposed value.
        proposal: Value,
        /// The round of the proof-of-lock this proposal carries, or `Round::NIL`.
        valid_round: Round,
    },
    /// A vote cast at the prevote stage.
    PreVote {
        /// The process that sent this message.
        src: Node,
        /// The round this vote is for.
        round: Round,
        /// The value id voted for, or `Nil`.
        id: NilOrVal<ValueId>,
    },
    /// A vote cast at the precommit stage.
    PreCommit {
        /// The process that sent this message.
        src: Node,
        /// The round this vote is for.
        round: Round,
        /// The value id voted for, or `Nil`.
        id: NilOrVal<ValueId>,
    },
}

impl Message {
    /// The process that sent this message.
    pub fn src(&self) -> &Node {
        match self {
            Message::Propose { src, .. } => src,
            Message::PreVote { src, .. } => src,
            Message::PreCommit { src, .. } => src,
        }
    }

    /// The round this message is for.
    pub fn round(&self) -> Round {
        match self {
            Message::Propose { round, .. } => *round,
            Message::PreVote { round, .. } => *round,
            Message::PreCommit { round, .. } => *round,
        }
    }

    /// The value id this vote carries. `None` for a [`Message::Propose`].
    pub fn vote_id(&self) -> Option<&NilOrVal<ValueId>> {
        match self {
            Message::Propose { .. } => None,
            Message::PreVote { id, .. } => Some(id),
            Message::PreCommit { id, .. } => Some(id),
        }
    }

    /// Whether this is a [`Message::PreVote`].
    pub fn is_prevote(&self) -> bool {
        matches!(self, Message::PreVote { .. })
    }

    /// Whether this is a [`Message::PreCommit`].
    pub fn is_precommit(&self) -> bool {
        matches!(self, Message::PreCommit { .. })
    }
}

/// Count the distinct sources among `votes` that are for `round` and carry `id`.
///
/// Equivocating duplicates from the same source count once: the guard conditions throughout
/// the upon rules are always over distinct senders, never raw message cardinality.
pub fn distinct_sources(votes: &BTreeSet<Message>, round: Round, id: &NilOrVal<ValueId>) -> usize {
    votes
        .iter()
        .filter(|m| m.round() == round && m.vote_id() == Some(id))
        .map(Message::src)
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use csmi_core_types::Value;

    fn prevote(src: &str, round: u32, id: NilOrVal<ValueId>) -> Message {
        Message::PreVote {
            src: Node::new(src),
            round: Round::new(round),
            id,
        }
    }

    #[test]
    fn distinct_sources_ignores_duplicates() {
        let v0 = Value::new("v0");
        let mut votes = BTreeSet::new();
        votes.insert(prevote("p1", 0, NilOrVal::Val(v0.id())));
        votes.insert(prevote("p1", 0, NilOrVal::Val(v0.id())));
        votes.insert(prevote("p2", 0, NilOrVal::Val(v0.id())));

        assert_eq!(distinct_sources(&votes, Round::ZERO, &NilOrVal::Val(v0.id())), 2);
    }

    #[test]
    fn distinct_sources_filters_by_round_and_id() {
        let v0 = Value::new("v0");
        let v1 = Value::new("v1");
        let mut votes = BTreeSet::new();
        votes.insert(prevote("p1", 0, NilOrVal::Val(v0.id())));
        votes.insert(prevote("p2", 0, NilOrVal::Val(v1.id())));
        votes.insert(prevote("p3", 1, NilOrVal::Val(v0.id())));

        assert_eq!(distinct_sources(&votes, Round::ZERO, &NilOrVal::Val(v0.id())), 1);
    }
}
