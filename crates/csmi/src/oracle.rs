//! Nondeterministic choice, made explicit and reproducible.
//!
//! The source this model is drawn from relies on language-level nondeterministic choice. Rather
//! than reach for ambient randomness, every choice the harness makes is routed through a
//! [`ChoiceOracle`], mirroring the way Malachite's model-based-testing crate drives its driver
//! off a deterministic, seeded `rand_chacha::ChaCha8Rng` instead of true nondeterminism.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of nondeterministic choices, abstract enough that tests can substitute a scripted
/// sequence of decisions in place of [`SeededOracle`]'s randomness.
pub trait ChoiceOracle {
    /// Choose an index uniformly in `0..n`.
    ///
    /// # Panics
    /// Implementations may panic if `n == 0`; callers only invoke this against a nonempty set
    /// of enabled choices.
    fn choose(&mut self, n: usize) -> usize;

    /// Choose a non-empty subset of the indices `0..n`, for the accelerated batching actions.
    ///
    /// # Panics
    /// Implementations may panic if `n == 0`.
    fn choose_subset(&mut self, n: usize) -> Vec<usize>;

    /// Flip a coin that lands heads with probability `pct / 100`.
    fn chance(&mut self, pct: u8) -> bool;
}

/// A [`ChoiceOracle`] backed by a seeded `ChaCha8Rng`, so that an entire run is reproducible
/// from a single `u64` seed.
pub struct SeededOracle {
    rng: ChaCha8Rng,
}

impl SeededOracle {
    /// Build an oracle seeded deterministically from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        SeededOracle {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ChoiceOracle for SeededOracle {
    fn choose(&mut self, n: usize) -> usize {
        assert!(n > 0, "choose called over an empty set of alternatives");
        self.rng.gen_range(0..n)
    }

    fn choose_subset(&mut self, n: usize) -> Vec<usize> {
        assert!(n > 0, "choose_subset called over an empty set of alternatives");
        loop {
            let subset: Vec<usize> = (0..n).filter(|_| self.rng.gen_bool(0.5)).collect();
            if !subset.is_empty() {
                return subset;
            }
        }
    }

    fn chance(&mut self, pct: u8) -> bool {
        let roll: u8 = self.rng.gen_range(1..=100);
        roll <= pct
    }
}
