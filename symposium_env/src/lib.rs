//! Symposium Environment Abstraction Layer
//!
//! This crate provides the seam between the allocation core and the world
//! it runs in. The core never reaches for a global RNG; every probabilistic
//! transition draws from an injected [`Entropy`] implementation.
//!
//! # Implementations
//!
//! - **Production**: [`OsEntropy`] - `StdRng` seeded from the OS (or a fixed seed)
//! - **Scripted**: [`ScriptedEntropy`] - replays a fixed sequence of outcomes
//! - **Simulation**: `SimContext` in `symposium_sim` - seeded ChaCha8
//!
//! By deriving all entropy from a single 64-bit seed, any interleaving
//! becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```
//! use symposium_env::{Entropy, OsEntropy};
//!
//! let mut a = OsEntropy::seeded(7);
//! let mut b = OsEntropy::seeded(7);
//! assert_eq!(a.chance(0.5), b.chance(0.5));
//! assert_eq!(a.pick(10), b.pick(10));
//! ```

mod context;
mod os_impl;
mod scripted;
mod types;

pub use context::{fixed_outcome, Entropy};
pub use os_impl::OsEntropy;
pub use scripted::ScriptedEntropy;
pub use types::{ActorId, ResourceId};
