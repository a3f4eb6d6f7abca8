//! The stage a process occupies within its current round.

use displaydoc::Display;

/// One of the four stages a process cycles through within a round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Stage {
    /// propose
    Propose,
    /// prevote
    PreVote,
    /// precommit
    PreCommit,
    /// decided
    Decided,
}
