//! Shared value model for the Tendermint consensus simulator: process identities, rounds,
//! values, timeouts and quorum counting. Independent of the round state machine itself so it
//! can be shared with the Byzantine message generator and the property checkers without pulling
//! in any transition logic.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod node;
pub use node::Node;

mod round;
pub use round::Round;

mod value;
pub use value::{NilOrVal, Value, ValueId};

mod quorum;
pub use quorum::QuorumParams;

mod timeout;
pub use timeout::{TimeoutEvent, TimeoutKind};
