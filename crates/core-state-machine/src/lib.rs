//! The per-process Tendermint state machine: `LocalState`, the `Message` wire type, the
//! `ConsensusOutput`s a transition can produce, and the upon rules and timeout handlers that
//! implement propose/prevote/precommit, locking, valid-value tracking and round advancement.
//!
//! This crate knows nothing about the network, scheduling, or nondeterminism — it exposes pure
//! functions of `(Config, LocalState, Message | TimeoutEvent) -> (LocalState, Vec<ConsensusOutput>)`
//! for the harness crate to drive.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod bookkeeping;
pub use bookkeeping::Bookkeeping;

mod config;
pub use config::Config;

pub mod message;
pub use message::Message;

mod output;
pub use output::ConsensusOutput;

mod stage;
pub use stage::Stage;

mod state;
pub use state::LocalState;

mod transitions;
pub use transitions::{
    fire_timeout_event, process_prevote_quorum_at_prevote_stage, receive_message, start_round,
};
