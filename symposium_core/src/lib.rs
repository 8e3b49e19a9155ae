//! Symposium Core - resource-allocation state machine
//!
//! N actors sit in a ring; each needs the two resources on either side of
//! it, and each resource is shared with one neighbour. This crate models:
//! 1. **Ownership**: exclusive resources with guarded release
//! 2. **Admission**: an uncoordinated left-then-right policy that can
//!    deadlock, and a central arbiter that cannot
//! 3. **Recovery**: detection of the all-blocked circular wait and a
//!    forced release that breaks it
//! 4. **Time travel**: non-aliased snapshots and a history cursor
//!
//! The engine is a deterministic single-threaded step function. All
//! randomness comes from an injected [`symposium_env::Entropy`].
//!
//! # Usage
//!
//! ```
//! use symposium_core::{EngineConfig, HistoryManager, PolicyKind, SimulationEngine};
//! use symposium_env::OsEntropy;
//!
//! let config = EngineConfig::new(5, PolicyKind::Arbitrated);
//! let mut engine = SimulationEngine::new(config, OsEntropy::seeded(42)).unwrap();
//! let mut history = HistoryManager::new(&engine);
//!
//! for _ in 0..100 {
//!     history.tick(&mut engine);
//! }
//! history.step_back(&mut engine);
//! assert_eq!(engine.state().step(), 99);
//! ```

pub mod actor;
pub mod config;
pub mod deadlock;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod history;
pub mod invariants;
pub mod policy;
pub mod resource;
pub mod state;

// Re-export key types for convenience
pub use actor::{Actor, ActorState, HeldSet};
pub use config::EngineConfig;
pub use deadlock::check_for_deadlock;
pub use engine::SimulationEngine;
pub use error::{CoreError, InvariantViolation};
pub use event_log::{Event, EventLog, LogEntry};
pub use history::{HistoryManager, Playback, Snapshot};
pub use invariants::check_invariants;
pub use policy::{Admission, Arbiter, PolicyKind};
pub use resource::ResourceUnit;
pub use state::SimulationState;
pub use symposium_env::{ActorId, ResourceId};
