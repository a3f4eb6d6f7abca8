//! Outputs produced by a transition, folded into the environment by the harness.

use csmi_core_types::TimeoutEvent;

use crate::Message;

/// One effect a transition asks the harness to apply. A single call to `receive_message` or
/// `fire_timeout_event` may return several of these; the harness applies all of them before the
/// next step begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsensusOutput {
    /// Send `Message` to every process, including the sender.
    Broadcast(Message),
    /// Start the given timeout, replacing any active one per the replacement policy.
    StartTimeout(TimeoutEvent),
    /// Record `Message` as evidence for later accountability analysis.
    CollectEvidence(Message),
    /// A debugging marker with no protocol effect.
    Breakpoint,
}
