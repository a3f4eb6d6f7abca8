//! The precondition-violation errors a named scenario action can fail with.
//!
//! The harness's primitive `receive_one_message`/`fire_one_timeout` never fail: their
//! preconditions are enforced by the caller picking from an already-enabled set of choices. A
//! named scenario action instead names a process and a filter the caller *believes* uniquely
//! identifies a message or timeout, and that belief can be wrong — that's what these errors are.

use csmi_core_types::Node;

/// Why a named scenario action failed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// no message in {process}'s buffer matches the requested filter
    #[error("no message in {process}'s buffer matches the requested filter")]
    NoMatchingMessage { process: Node },
    /// Too many distinct messages satisfied the filter, where the action requires exactly one.
    #[error("{count} messages in {process}'s buffer match the requested filter, expected exactly one")]
    AmbiguousMatchingMessages { process: Node, count: usize },
    /// `expire_timeout` was called on a process with nothing scheduled.
    #[error("{process} has no active timeout")]
    NoActiveTimeout { process: Node },
    /// The named process isn't part of this scenario's environment.
    #[error("{process} is not known to this scenario")]
    UnknownProcess { process: Node },
}
