//! Global ownership invariants, checked after any tick.

use crate::actor::ActorState;
use crate::error::InvariantViolation;
use crate::state::SimulationState;
use symposium_env::ActorId;

/// Checks every global invariant of `state`.
///
/// 1. A resource's holder and the actors' held sets agree exactly.
/// 2. Eating if and only if both candidate resources are held.
/// 3. A waiting actor is blocked, on a resource someone else holds.
/// 4. The arbiter never seats more than `floor(N/2)` actors, and its
///    eating set matches the actors' states.
pub fn check_invariants(state: &SimulationState) -> Result<(), InvariantViolation> {
    let actors = state.actors();
    let resources = state.resources();

    if actors.len() != resources.len() {
        return Err(InvariantViolation::RingShape {
            actors: actors.len(),
            resources: resources.len(),
        });
    }

    for resource in resources {
        let claimants: Vec<ActorId> = actors
            .iter()
            .filter(|a| a.holds(resource.id()))
            .map(|a| a.id())
            .collect();
        let consistent = match resource.holder() {
            Some(holder) => claimants == [holder],
            None => claimants.is_empty(),
        };
        if !consistent {
            return Err(InvariantViolation::OwnershipMismatch {
                resource: resource.id(),
                holder: resource.holder(),
            });
        }
    }

    for actor in actors {
        let eating = actor.state() == ActorState::Eating;
        let full = actor.holds_both() && actor.held().len() == 2;
        if eating && !full {
            return Err(InvariantViolation::EatingWithoutResources { actor: actor.id() });
        }
        if full && !eating {
            return Err(InvariantViolation::HoldingBothWithoutEating { actor: actor.id() });
        }

        if let Some(waited) = actor.waiting_for() {
            if actor.state() != ActorState::Blocked {
                return Err(InvariantViolation::WaitingWhileNotBlocked { actor: actor.id() });
            }
            let held_elsewhere = state
                .resource(waited)
                .and_then(|r| r.holder())
                .is_some_and(|holder| holder != actor.id());
            if !held_elsewhere {
                return Err(InvariantViolation::WaitingOnUnheld {
                    actor: actor.id(),
                    resource: waited,
                });
            }
        }
    }

    if let Some(arbiter) = state.arbiter() {
        if arbiter.eating_count() > arbiter.max_concurrent() {
            return Err(InvariantViolation::ArbiterOverCapacity {
                eating: arbiter.eating_count(),
                limit: arbiter.max_concurrent(),
            });
        }
        for actor in actors {
            if arbiter.is_eating(actor.id()) != (actor.state() == ActorState::Eating) {
                return Err(InvariantViolation::ArbiterMismatch { actor: actor.id() });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::policy::PolicyKind;
    use symposium_env::ResourceId;

    fn fresh(n: usize, policy: PolicyKind) -> SimulationState {
        SimulationState::new(&EngineConfig::new(n, policy))
    }

    #[test]
    fn test_fresh_state_is_valid() {
        assert!(check_invariants(&fresh(5, PolicyKind::Uncoordinated)).is_ok());
        assert!(check_invariants(&fresh(2, PolicyKind::Arbitrated)).is_ok());
    }

    #[test]
    fn test_detects_unconditional_release_bug() {
        // Actor 1 owns R1; the resource is cleared behind its back.
        let mut state = fresh(5, PolicyKind::Uncoordinated);
        {
            let (mut ring, _) = state.split();
            assert!(ring.request(ActorId(1), ResourceId(1)));
            ring.resources[1] = crate::resource::ResourceUnit::new(ResourceId(1));
        }
        assert_eq!(
            check_invariants(&state),
            Err(InvariantViolation::OwnershipMismatch {
                resource: ResourceId(1),
                holder: None,
            })
        );
    }

    #[test]
    fn test_detects_eating_without_resources() {
        let mut state = fresh(3, PolicyKind::Uncoordinated);
        {
            let (mut ring, _) = state.split();
            ring.actor_mut(ActorId(0)).set_state(ActorState::Eating);
        }
        assert_eq!(
            check_invariants(&state),
            Err(InvariantViolation::EatingWithoutResources { actor: ActorId(0) })
        );
    }

    #[test]
    fn test_detects_wait_on_free_resource() {
        let mut state = fresh(4, PolicyKind::Uncoordinated);
        {
            let (mut ring, _) = state.split();
            ring.request(ActorId(3), ResourceId(3));
            assert!(!ring.request(ActorId(2), ResourceId(3)));
            ring.actor_mut(ActorId(2)).set_state(ActorState::Blocked);
        }
        assert!(check_invariants(&state).is_ok());

        {
            // Bypass the engine: release without waking the waiter
            let (ring, _) = state.split();
            ring.actors[3].release_resource(&mut ring.resources[3]);
        }
        assert_eq!(
            check_invariants(&state),
            Err(InvariantViolation::WaitingOnUnheld {
                actor: ActorId(2),
                resource: ResourceId(3),
            })
        );
    }

    #[test]
    fn test_detects_waiting_while_hungry() {
        let mut state = fresh(4, PolicyKind::Uncoordinated);
        {
            let (mut ring, _) = state.split();
            ring.request(ActorId(1), ResourceId(1));
            ring.request(ActorId(0), ResourceId(1));
            ring.actor_mut(ActorId(0)).set_state(ActorState::Hungry);
        }
        assert_eq!(
            check_invariants(&state),
            Err(InvariantViolation::WaitingWhileNotBlocked { actor: ActorId(0) })
        );
    }
}
