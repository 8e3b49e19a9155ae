//! Production implementation of Entropy backed by `StdRng`.

use crate::context::{fixed_outcome, Entropy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Production entropy backed by OS-seeded `StdRng`.
///
/// This is the "real" implementation used by interactive hosts. It can
/// also be pinned to a seed when a host wants a replayable session.
pub struct OsEntropy {
    /// Seed the generator was built from (0 when OS-seeded)
    seed: u64,

    rng: StdRng,
}

impl OsEntropy {
    /// Creates a generator seeded from operating-system entropy.
    pub fn new() -> Self {
        Self {
            seed: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a generator with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for OsEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl Entropy for OsEntropy {
    fn chance(&mut self, p: f64) -> bool {
        match fixed_outcome(p) {
            Some(outcome) => outcome,
            None => self.rng.gen_bool(p),
        }
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
