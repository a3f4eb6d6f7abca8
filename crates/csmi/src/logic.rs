//! The abstract seam between the harness and a concrete consensus algorithm.

use crate::Environment;

/// The five types a consensus algorithm must supply, bundled the way Malachite's `Context`
/// bundles a consensus engine's concrete `Height`/`Proposal`/`Vote`/`Value` types: one trait,
/// one `impl` per algorithm, rather than five separate generic parameters threaded through
/// every function in the harness.
pub trait ConsensusLogic: Sized {
    /// The opaque name a process is known by.
    type ProcessId: Ord + Clone + std::fmt::Debug;
    /// The per-process local state this algorithm mutates.
    type State: Clone;
    /// The messages processes exchange.
    type Message: Ord + Clone;
    /// The payload of a scheduled timeout.
    type Timeout: Clone;
    /// Auxiliary bookkeeping threaded through every transition but never consulted by it.
    type Bookkeeping;
    /// One effect a transition can ask the harness to apply.
    type Output;

    /// Build the initial local state for `process`.
    fn initialize_process(&self, process: &Self::ProcessId) -> Self::State;

    /// Consume an inbound message, returning the next state and the outputs it produced.
    fn receive_message(
        &self,
        state: Self::State,
        msg: Self::Message,
    ) -> (Self::State, Vec<Self::Output>);

    /// Consume an expired timeout, returning the next state and the outputs it produced.
    fn fire_timeout_event(
        &self,
        state: Self::State,
        timeout: Self::Timeout,
    ) -> (Self::State, Vec<Self::Output>);

    /// Fold one output into the environment on behalf of `process`.
    fn apply_effect(
        &self,
        env: &mut Environment<Self>,
        process: &Self::ProcessId,
        output: Self::Output,
    );

    /// Whether `new` should replace `old` as the single active timeout for a process.
    fn should_replace(&self, old: &Self::Timeout, new: &Self::Timeout) -> bool;
}
