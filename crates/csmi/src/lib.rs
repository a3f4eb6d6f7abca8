//! The Consensus State Machine Interface: a reusable harness that turns any per-process
//! consensus logic into a nondeterministic distributed simulator.
//!
//! The harness owns the [`Environment`] (per-process state, inbound message buffers, active
//! timeouts, and bookkeeping) and knows nothing about what a message or a timeout *means* — that
//! is supplied by an implementation of [`ConsensusLogic`], the same way Malachite's `Context`
//! trait bundles the concrete types a generic driver is instantiated over. [`step`] and its
//! siblings dispatch exactly one event (or, for the accelerated variants, a batch of one kind of
//! event) per call, using a [`ChoiceOracle`] for every nondeterministic choice so that a run is
//! reproducible from a seed.

mod environment;
mod logic;
mod oracle;
mod step;

pub mod tendermint;

pub use environment::Environment;
pub use logic::ConsensusLogic;
pub use oracle::{ChoiceOracle, SeededOracle};
pub use step::{
    fire_one_timeout, receive_byzantine, receive_msg_accelerated, receive_one_message,
    receive_timeout_accelerated, step, step_accelerated, step_no_timeout, StepOutcome,
};
