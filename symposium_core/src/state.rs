//! The self-contained simulation state and its read-only view.

use crate::actor::{Actor, ActorState};
use crate::config::EngineConfig;
use crate::event_log::EventLog;
use crate::policy::{Admission, Arbiter, PolicyKind, Ring};
use crate::resource::ResourceUnit;
use serde::{Deserialize, Serialize};
use symposium_env::{ActorId, ResourceId};

/// Everything the engine mutates during a tick.
///
/// Actors and resources live in two arenas indexed by id; nothing in here
/// points at anything else, so cloning yields a fully independent copy.
/// Hosts get this type only by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    actors: Vec<Actor>,
    resources: Vec<ResourceUnit>,
    admission: Admission,
    step: u64,
    log: EventLog,
}

impl SimulationState {
    /// Builds the initial state: everyone thinking, nothing held.
    pub(crate) fn new(config: &EngineConfig) -> Self {
        let n = config.actor_count;
        Self {
            actors: (0..n).map(|i| Actor::new(ActorId::from_index(i), n)).collect(),
            resources: (0..n)
                .map(|i| ResourceUnit::new(ResourceId::from_index(i)))
                .collect(),
            admission: Admission::new(config.policy, n),
            step: 0,
            log: EventLog::new(config.log_capacity),
        }
    }

    /// Number of completed ticks.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.index())
    }

    pub fn resources(&self) -> &[ResourceUnit] {
        &self.resources
    }

    pub fn resource(&self, id: ResourceId) -> Option<&ResourceUnit> {
        self.resources.get(id.index())
    }

    pub fn admission(&self) -> &Admission {
        &self.admission
    }

    pub fn policy(&self) -> PolicyKind {
        self.admission.kind()
    }

    /// Arbiter state under the arbitrated policy.
    pub fn arbiter(&self) -> Option<&Arbiter> {
        self.admission.arbiter()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Actor whose turn the next tick is.
    pub fn next_turn(&self) -> ActorId {
        ActorId::from_index((self.step % self.actors.len() as u64) as usize)
    }

    /// Number of actors currently in `state`.
    pub fn count_in(&self, state: ActorState) -> usize {
        self.actors.iter().filter(|a| a.state() == state).count()
    }

    pub(crate) fn log_mut(&mut self) -> &mut EventLog {
        &mut self.log
    }

    pub(crate) fn advance(&mut self) {
        self.step += 1;
    }

    /// Splits the state into the tick view and the policy.
    pub(crate) fn split(&mut self) -> (Ring<'_>, &mut Admission) {
        let step = self.step;
        (
            Ring {
                actors: &mut self.actors,
                resources: &mut self.resources,
                log: &mut self.log,
                step,
            },
            &mut self.admission,
        )
    }
}
