//! Safety properties over a Tendermint [`Environment`]: agreement, validity, accountability
//! (equivocation + amnesia detection), plus the structural invariants named in the testable
//! properties section — stage monotonicity and the single-active-timeout rule.
//!
//! None of these checks participate in the protocol; they are read-only analyses over a
//! snapshot of the environment and its bookkeeping, the way `core-votekeeper`'s `EvidenceMap`
//! is consulted only by accountability tooling and never by the round state machine itself.

mod accountability;
mod agreement;
mod invariants;
mod validity;

pub use accountability::{accountability_holds, amnesia_by, equivocates};
pub use agreement::agreement_holds;
pub use invariants::{state_invariants_hold, StageMonitor, StageViolation};
pub use validity::validity_holds;
