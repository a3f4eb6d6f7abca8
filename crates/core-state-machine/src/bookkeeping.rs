//! Evidence accumulated while firing quorum-dependent rules, used only for accountability
//! analysis and never consulted by the protocol transitions themselves.

use alloc::collections::BTreeSet;

use crate::Message;

/// The three evidence sets plus a debugging latch, threaded through every transition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bookkeeping {
    /// Proposals examined while firing a propose rule.
    pub evidence_propose: BTreeSet<Message>,
    /// Prevotes examined while firing a quorum-dependent rule.
    pub evidence_prevote: BTreeSet<Message>,
    /// Precommits examined while firing a quorum-dependent rule.
    pub evidence_precommit: BTreeSet<Message>,
    /// Set by `Breakpoint` outputs; inspected by tooling, ignored by the protocol.
    pub breakpoint: bool,
}

impl Bookkeeping {
    /// An empty bookkeeping record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message as evidence, in the set matching its kind.
    pub fn collect(&mut self, message: Message) {
        match &message {
            Message::Propose { .. } => {
                self.evidence_propose.insert(message);
            }
            Message::PreVote { .. } => {
                self.evidence_prevote.insert(message);
            }
            Message::PreCommit { .. } => {
                self.evidence_precommit.insert(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csmi_core_types::{NilOrVal, Node, Round, Value};

    #[test]
    fn collect_is_idempotent_and_sorts_by_kind() {
        let mut bk = Bookkeeping::new();
        let vote = Message::PreVote {
            src: Node::new("p1"),
            round: Round::ZERO,
            id: NilOrVal::Val(Value::new("v0").id()),
        };

        bk.collect(vote.clone());
        bk.collect(vote);

        assert_eq!(bk.evidence_prevote.len(), 1);
        assert!(bk.evidence_propose.is_empty());
        assert!(bk.evidence_precommit.is_empty());
    }
}
