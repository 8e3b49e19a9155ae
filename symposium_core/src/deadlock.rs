//! Deadlock detection and recovery.
//!
//! In a ring where every actor wants exactly its two neighbouring
//! resources, "every actor is blocked while holding something" already
//! implies a circular wait, so no wait-for graph is built.

use crate::actor::ActorState;
use crate::event_log::Event;
use crate::policy::PolicyKind;
use crate::state::SimulationState;
use symposium_env::{ActorId, Entropy};
use tracing::warn;

/// Returns true when every actor is blocked, holds at least one resource
/// and awaits another.
///
/// Always false under the arbitrated policy, which cannot deadlock.
pub fn check_for_deadlock(state: &SimulationState) -> bool {
    if state.policy() == PolicyKind::Arbitrated || state.actor_count() == 0 {
        return false;
    }
    state.actors().iter().all(|a| {
        a.state() == ActorState::Blocked && !a.held().is_empty() && a.waiting_for().is_some()
    })
}

/// Actors that are blocked while holding a resource.
pub fn blocked_holders(state: &SimulationState) -> Vec<ActorId> {
    state
        .actors()
        .iter()
        .filter(|a| a.state() == ActorState::Blocked && !a.held().is_empty())
        .map(|a| a.id())
        .collect()
}

/// Breaks a detected deadlock.
///
/// Picks one blocked actor uniformly at random, forces it to release
/// everything and sends it back to thinking. Returns the victim, or None
/// if the ring was not deadlocked.
pub(crate) fn recover<E: Entropy + ?Sized>(
    state: &mut SimulationState,
    entropy: &mut E,
) -> Option<ActorId> {
    if !check_for_deadlock(state) {
        return None;
    }
    let blocked = blocked_holders(state);
    let victim = blocked[entropy.pick(blocked.len())];

    let (mut ring, admission) = state.split();
    let released = ring.release_all(victim);
    let actor = ring.actor_mut(victim);
    actor.clear_wait();
    actor.set_state(ActorState::Thinking);
    admission.finished(victim);
    ring.log(victim, Event::DeadlockRecovered);

    warn!(
        "Deadlock broken at step {}: {} released {} resource(s)",
        ring.step,
        victim,
        released.len()
    );
    Some(victim)
}
