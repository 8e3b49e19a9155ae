//! SimulationEngine - drives one actor transition per tick.

use crate::actor::ActorState;
use crate::config::EngineConfig;
use crate::deadlock;
use crate::error::CoreError;
use crate::event_log::Event;
use crate::history::Snapshot;
use crate::policy::PolicyKind;
use crate::state::SimulationState;
use symposium_env::{ActorId, Entropy};
use tracing::{debug, info, warn};

/// Owns the arenas, the active policy and the injected entropy.
///
/// Each call to [`step`](Self::step) processes exactly one actor, chosen
/// round-robin by `step mod N`. Nothing here is shared or locked: turn
/// taking is what keeps two actors from touching the same resource in
/// the same tick.
pub struct SimulationEngine<E: Entropy> {
    config: EngineConfig,
    state: SimulationState,
    entropy: E,
}

impl<E: Entropy> SimulationEngine<E> {
    /// Creates an engine from a validated configuration.
    ///
    /// # Errors
    /// Returns a configuration error if `actor_count < 2` or a
    /// probability is outside `[0, 1]`.
    pub fn new(config: EngineConfig, entropy: E) -> Result<Self, CoreError> {
        config.validate()?;
        info!(
            "Engine ready: {} actors, {} policy (seed={})",
            config.actor_count,
            config.policy,
            entropy.seed()
        );
        let state = SimulationState::new(&config);
        Ok(Self {
            config,
            state,
            entropy,
        })
    }

    /// Read-only view of the live state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seed of the injected entropy.
    pub fn seed(&self) -> u64 {
        self.entropy.seed()
    }

    /// Advances exactly one tick and returns the updated view.
    pub fn step(&mut self) -> &SimulationState {
        let id = self.state.next_turn();
        let hunger = self.config.hunger_probability;
        let finish = self.config.finish_probability;

        {
            let (mut ring, admission) = self.state.split();
            match ring.actor(id).state() {
                ActorState::Thinking => {
                    if self.entropy.chance(hunger) {
                        ring.actor_mut(id).set_state(ActorState::Hungry);
                        ring.log(id, Event::BecameHungry);
                        admission.became_hungry(&mut ring, id);
                        debug!("{} became hungry", id);
                    }
                }
                ActorState::Hungry => admission.hungry_turn(&mut ring, id),
                ActorState::Blocked => admission.blocked_turn(&mut ring, id),
                ActorState::Eating => {
                    if self.entropy.chance(finish) {
                        ring.release_all(id);
                        ring.actor_mut(id).set_state(ActorState::Thinking);
                        admission.finished(id);
                        ring.log(id, Event::FinishedEating);
                        debug!("{} finished eating", id);
                    }
                }
            }
            admission.admit_next(&mut ring);
        }

        if self.state.policy() == PolicyKind::Uncoordinated && self.check_for_deadlock() {
            let step = self.state.step();
            self.state.log_mut().push(step, None, Event::DeadlockDetected);
            warn!("Deadlock detected at step {}", step);
            if self.config.auto_recover {
                self.recover_from_deadlock();
            }
        }

        self.state.advance();
        &self.state
    }

    /// Rebuilds the construction-time state wholesale.
    ///
    /// The entropy stream is not rewound.
    pub fn reset(&mut self) {
        debug!("Engine reset at step {}", self.state.step());
        self.state = SimulationState::new(&self.config);
    }

    /// Captures a deep copy of the live state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Replaces the live state with the snapshot's copy.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.state = snapshot.state().clone();
    }

    /// See [`deadlock::check_for_deadlock`].
    pub fn check_for_deadlock(&self) -> bool {
        deadlock::check_for_deadlock(&self.state)
    }

    /// Breaks a detected deadlock and returns the victim.
    pub fn recover_from_deadlock(&mut self) -> Option<ActorId> {
        deadlock::recover(&mut self.state, &mut self.entropy)
    }

    /// Makes a thinking actor hungry out of band (e.g. a user click).
    ///
    /// Returns `Ok(false)` when the actor is in any other state.
    pub fn force_hungry(&mut self, id: ActorId) -> Result<bool, CoreError> {
        let state = self
            .state
            .actor(id)
            .map(|a| a.state())
            .ok_or(CoreError::UnknownActor(id))?;
        if state != ActorState::Thinking {
            return Ok(false);
        }

        let (mut ring, admission) = self.state.split();
        ring.actor_mut(id).set_state(ActorState::Hungry);
        ring.log(id, Event::ForcedHungry);
        admission.became_hungry(&mut ring, id);
        Ok(true)
    }
}
