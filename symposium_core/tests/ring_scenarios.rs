//! End-to-end ownership and admission scenarios on a five-actor ring.

use symposium_core::{
    check_invariants, Actor, ActorId, ActorState, EngineConfig, Event, PolicyKind, ResourceId,
    ResourceUnit, SimulationEngine,
};
use symposium_env::ScriptedEntropy;

fn ring(n: usize) -> (Vec<Actor>, Vec<ResourceUnit>) {
    let actors = (0..n).map(|i| Actor::new(ActorId::from_index(i), n)).collect();
    let resources = (0..n)
        .map(|i| ResourceUnit::new(ResourceId::from_index(i)))
        .collect();
    (actors, resources)
}

#[test]
fn test_contended_resource_stays_with_first_holder() {
    let (mut actors, mut resources) = ring(5);
    let (a0, rest) = actors.split_at_mut(1);
    let (a0, a1) = (&mut a0[0], &mut rest[0]);

    assert!(a0.request_resource(&mut resources[0]));
    assert_eq!(resources[0].holder(), Some(ActorId(0)));

    assert!(!a1.request_resource(&mut resources[0]));
    assert_eq!(resources[0].holder(), Some(ActorId(0)));
    assert_eq!(a1.waiting_for(), Some(ResourceId(0)));

    // A release by the non-holder must not clear ownership
    assert!(!a1.release_resource(&mut resources[0]));
    assert_eq!(resources[0].holder(), Some(ActorId(0)));

    assert!(a0.release_resource(&mut resources[0]));
    assert_eq!(resources[0].holder(), None);
}

#[test]
fn test_two_resources_never_shared() {
    let (mut actors, mut resources) = ring(5);

    assert!(actors[2].request_resource(&mut resources[2]));
    assert_no_other_holder(&actors, ActorId(2));
    assert!(actors[2].request_resource(&mut resources[1]));
    assert_no_other_holder(&actors, ActorId(2));

    let held: Vec<_> = actors[2].held().iter().collect();
    assert_eq!(held, vec![ResourceId(1), ResourceId(2)]);
    assert_eq!(resources[1].holder(), Some(ActorId(2)));
    assert_eq!(resources[2].holder(), Some(ActorId(2)));

    // Neighbours asking for them are turned away
    assert!(!actors[1].request_resource(&mut resources[1]));
    assert!(!actors[3].request_resource(&mut resources[2]));
    assert_no_other_holder(&actors, ActorId(2));
}

fn assert_no_other_holder(actors: &[Actor], owner: ActorId) {
    for actor in actors.iter().filter(|a| a.id() != owner) {
        assert!(!actor.holds(ResourceId(1)));
        assert!(!actor.holds(ResourceId(2)));
    }
}

#[test]
fn test_arbiter_holds_back_shared_neighbour() {
    let config = EngineConfig::new(5, PolicyKind::Arbitrated)
        .with_hunger_probability(0.0)
        .with_finish_probability(1.0);
    let mut engine = SimulationEngine::new(config, ScriptedEntropy::default()).unwrap();
    assert_eq!(engine.state().arbiter().unwrap().max_concurrent(), 2);

    for id in [0, 2, 1] {
        assert!(engine.force_hungry(ActorId(id)).unwrap());
    }

    engine.step(); // admits 0
    engine.step(); // admits 2
    let arbiter = engine.state().arbiter().unwrap();
    assert_eq!(
        arbiter.currently_eating().collect::<Vec<_>>(),
        vec![ActorId(0), ActorId(2)]
    );
    assert_eq!(arbiter.queue().collect::<Vec<_>>(), vec![ActorId(1)]);

    // Actor 1 stays queued while either neighbour eats
    let mut admitted_at = None;
    for _ in 0..10 {
        engine.step();
        let state = engine.state();
        check_invariants(state).unwrap();

        let a1 = state.actor(ActorId(1)).unwrap();
        let neighbour_eating = [ActorId(0), ActorId(2)]
            .iter()
            .any(|id| state.actor(*id).unwrap().state() == ActorState::Eating);
        if a1.state() == ActorState::Eating {
            assert!(!neighbour_eating);
            admitted_at.get_or_insert(state.step());
        } else if admitted_at.is_none() {
            assert!(state.arbiter().unwrap().is_queued(ActorId(1)));
        }
    }
    // Actor 2 finishes in tick 2, actor 0 in tick 5, and 1 is seated in
    // that same tick (reported as step 6 once it completes)
    assert_eq!(admitted_at, Some(6));
}

#[test]
fn test_deadlock_detected_and_recovered() {
    let config = EngineConfig::new(5, PolicyKind::Uncoordinated)
        .with_hunger_probability(1.0)
        .with_finish_probability(0.0)
        .with_auto_recover(false);
    let entropy = ScriptedEntropy::default().with_picks([4]);
    let mut engine = SimulationEngine::new(config, entropy).unwrap();

    while !engine.check_for_deadlock() {
        engine.step();
        assert!(engine.state().step() < 100, "ring never deadlocked");
    }

    for actor in engine.state().actors() {
        assert_eq!(actor.state(), ActorState::Blocked);
        assert_eq!(actor.held().len(), 1);
        let expected = ResourceId::from_index((actor.id().index() + 1) % 5);
        assert_eq!(actor.waiting_for(), Some(expected));
    }

    assert_eq!(engine.recover_from_deadlock(), Some(ActorId(4)));
    assert!(!engine.check_for_deadlock());
    check_invariants(engine.state()).unwrap();

    let empty: Vec<_> = engine
        .state()
        .actors()
        .iter()
        .filter(|a| a.held().is_empty())
        .collect();
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].id(), ActorId(4));
    assert_eq!(empty[0].state(), ActorState::Thinking);

    assert!(engine.state().log().contains(Event::DeadlockDetected));
    assert!(engine.state().log().contains(Event::DeadlockRecovered));
    assert_eq!(engine.recover_from_deadlock(), None);
}

#[test]
fn test_arbitrated_never_deadlocks_when_everyone_is_hungry() {
    let config = EngineConfig::new(5, PolicyKind::Arbitrated)
        .with_hunger_probability(1.0)
        .with_finish_probability(0.5);
    let entropy = ScriptedEntropy::constant(false).with_coins([true, false, true, true, false]);
    let mut engine = SimulationEngine::new(config, entropy).unwrap();

    for _ in 0..200 {
        engine.step();
        check_invariants(engine.state()).unwrap();
        assert!(!engine.check_for_deadlock());
        assert_eq!(engine.state().count_in(ActorState::Blocked), 0);
    }
}
