//! Core entropy trait for Symposium engines.

/// The central interface for randomness.
///
/// This trait abstracts the random source so that the allocation engine can
/// run against OS entropy in an interactive host and against a seeded stream
/// in tests and in the simulation harness.
///
/// # Determinism
///
/// Implementations seeded with the same value must return the same sequence
/// of draws for the same sequence of calls. Recorded histories depend on it.
pub trait Entropy {
    /// Bernoulli draw with probability `p`.
    ///
    /// `p <= 0.0` (and NaN) never fires, `p >= 1.0` always fires. Neither
    /// edge consumes a draw, so scripted runs stay aligned when a
    /// configuration pins a probability to 0 or 1.
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform index in `0..len`.
    ///
    /// Callers guarantee `len > 0`.
    fn pick(&mut self, len: usize) -> usize;

    /// Returns the master seed (for logging/debugging).
    ///
    /// Unseeded production entropy returns 0.
    fn seed(&self) -> u64;
}

impl<E: Entropy + ?Sized> Entropy for &mut E {
    fn chance(&mut self, p: f64) -> bool {
        (**self).chance(p)
    }

    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}

impl<E: Entropy + ?Sized> Entropy for Box<E> {
    fn chance(&mut self, p: f64) -> bool {
        (**self).chance(p)
    }

    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}

/// Clamps the degenerate probability edges shared by every implementation.
///
/// Returns `Some(outcome)` when no draw is needed.
pub fn fixed_outcome(p: f64) -> Option<bool> {
    if p.is_nan() || p <= 0.0 {
        Some(false)
    } else if p >= 1.0 {
        Some(true)
    } else {
        None
    }
}
