//! Error types for the allocation core.

use symposium_env::ActorId;
use thiserror::Error;

/// Errors surfaced by engine construction and external stimuli.
///
/// Everything else the engine does is total: contention, failed requests,
/// foreign releases and deadlock are modelled outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A ring needs at least two actors to share resources
    #[error("Invalid actor count: {0} (need at least 2)")]
    InvalidActorCount(usize),

    /// A transition probability outside `[0, 1]`
    #[error("Invalid probability for {name}: {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    /// The event log must keep at least one entry
    #[error("Event log capacity must be at least 1")]
    InvalidLogCapacity,

    /// An actor id outside the ring
    #[error("Unknown actor: {0}")]
    UnknownActor(ActorId),
}

/// A global ownership invariant that failed to hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{resource} reports holder {holder:?} but the held sets disagree")]
    OwnershipMismatch {
        resource: symposium_env::ResourceId,
        holder: Option<ActorId>,
    },

    #[error("{actor} is eating without holding both of its resources")]
    EatingWithoutResources { actor: ActorId },

    #[error("{actor} holds both of its resources but is not eating")]
    HoldingBothWithoutEating { actor: ActorId },

    #[error("{actor} is waiting but not blocked")]
    WaitingWhileNotBlocked { actor: ActorId },

    #[error("{actor} waits on {resource} which is not held by another actor")]
    WaitingOnUnheld {
        actor: ActorId,
        resource: symposium_env::ResourceId,
    },

    #[error("arbiter admitted {eating} eaters, limit is {limit}")]
    ArbiterOverCapacity { eating: usize, limit: usize },

    #[error("{actor} eating state disagrees with the arbiter's eating set")]
    ArbiterMismatch { actor: ActorId },

    #[error("ring has {actors} actors but {resources} resources")]
    RingShape { actors: usize, resources: usize },
}
