//! Admission policies: how an actor obtains its two resources.
//!
//! - **Uncoordinated**: every actor grabs its left resource, then its right,
//!   one per turn, and keeps what it holds while blocked. This reproduces
//!   the classic circular wait.
//! - **Arbitrated**: hungry actors queue at a central arbiter, which admits
//!   the queue head only when a seat is free and neither ring neighbour is
//!   eating. Admission acquires both resources atomically, so nobody ever
//!   holds one resource while waiting for the other.

use crate::actor::{Actor, ActorState, HeldSet};
use crate::event_log::{Event, EventLog};
use crate::resource::ResourceUnit;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use symposium_env::{ActorId, ResourceId};
use tracing::{debug, error};

/// Which admission policy an engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    Uncoordinated,
    Arbitrated,
}

impl PolicyKind {
    pub fn all() -> [PolicyKind; 2] {
        [PolicyKind::Uncoordinated, PolicyKind::Arbitrated]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Uncoordinated => "uncoordinated",
            PolicyKind::Arbitrated => "arbitrated",
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uncoordinated" | "naive" => Ok(PolicyKind::Uncoordinated),
            "arbitrated" | "waiter" => Ok(PolicyKind::Arbitrated),
            _ => Err(format!("Unknown policy: {}", s)),
        }
    }
}

/// Central admission controller for the arbitrated policy.
///
/// Membership is tracked with per-actor flags next to the FIFO so that
/// enqueueing is idempotent and neighbour checks are O(1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arbiter {
    queue: VecDeque<ActorId>,
    queued: Vec<bool>,
    eating: Vec<bool>,
    eating_count: usize,
    max_concurrent: usize,
}

impl Arbiter {
    /// Creates an arbiter for a ring of `ring_size` actors.
    ///
    /// At most `floor(ring_size / 2)` actors eat at once.
    pub fn new(ring_size: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(ring_size),
            queued: vec![false; ring_size],
            eating: vec![false; ring_size],
            eating_count: 0,
            max_concurrent: ring_size / 2,
        }
    }

    pub fn ring_size(&self) -> usize {
        self.eating.len()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Waiting actors, head first.
    pub fn queue(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.queue.iter().copied()
    }

    pub fn head(&self) -> Option<ActorId> {
        self.queue.front().copied()
    }

    pub fn is_queued(&self, id: ActorId) -> bool {
        self.queued.get(id.index()).copied().unwrap_or(false)
    }

    pub fn is_eating(&self, id: ActorId) -> bool {
        self.eating.get(id.index()).copied().unwrap_or(false)
    }

    /// Admitted actors in id order.
    pub fn currently_eating(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.eating
            .iter()
            .enumerate()
            .filter(|(_, eating)| **eating)
            .map(|(i, _)| ActorId::from_index(i))
    }

    pub fn eating_count(&self) -> usize {
        self.eating_count
    }

    /// Ring neighbours of `id`: `(id - 1) mod N` and `(id + 1) mod N`.
    pub fn neighbours(&self, id: ActorId) -> (ActorId, ActorId) {
        let n = self.ring_size();
        let i = id.index();
        (
            ActorId::from_index((i + n - 1) % n),
            ActorId::from_index((i + 1) % n),
        )
    }

    /// Adds `id` to the queue. Returns false if it was already queued or
    /// is currently eating.
    pub fn enqueue(&mut self, id: ActorId) -> bool {
        if id.index() >= self.ring_size() || self.is_queued(id) || self.is_eating(id) {
            return false;
        }
        self.queued[id.index()] = true;
        self.queue.push_back(id);
        true
    }

    /// Whether `id` could be seated right now.
    pub fn can_admit(&self, id: ActorId) -> bool {
        let (prev, next) = self.neighbours(id);
        self.eating_count < self.max_concurrent
            && !self.is_eating(id)
            && !self.is_eating(prev)
            && !self.is_eating(next)
    }

    /// Removes `id` from the eating set. Returns whether it was there.
    pub fn finish(&mut self, id: ActorId) -> bool {
        if !self.is_eating(id) {
            return false;
        }
        self.eating[id.index()] = false;
        self.eating_count -= 1;
        true
    }

    fn pop_head(&mut self) -> Option<ActorId> {
        let head = self.queue.pop_front()?;
        self.queued[head.index()] = false;
        Some(head)
    }

    fn seat(&mut self, id: ActorId) {
        self.eating[id.index()] = true;
        self.eating_count += 1;
    }
}

/// Live policy state. The arbiter exists only under the arbitrated policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Admission {
    Uncoordinated,
    Arbitrated(Arbiter),
}

impl Admission {
    pub fn new(kind: PolicyKind, ring_size: usize) -> Self {
        match kind {
            PolicyKind::Uncoordinated => Admission::Uncoordinated,
            PolicyKind::Arbitrated => Admission::Arbitrated(Arbiter::new(ring_size)),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Admission::Uncoordinated => PolicyKind::Uncoordinated,
            Admission::Arbitrated(_) => PolicyKind::Arbitrated,
        }
    }

    pub fn arbiter(&self) -> Option<&Arbiter> {
        match self {
            Admission::Uncoordinated => None,
            Admission::Arbitrated(arbiter) => Some(arbiter),
        }
    }

    /// Called when an actor turns hungry (by chance or by force).
    pub(crate) fn became_hungry(&mut self, ring: &mut Ring<'_>, id: ActorId) {
        if let Admission::Arbitrated(arbiter) = self {
            if arbiter.enqueue(id) {
                ring.log(id, Event::Enqueued);
            }
        }
    }

    /// A hungry actor's turn.
    pub(crate) fn hungry_turn(&mut self, ring: &mut Ring<'_>, id: ActorId) {
        match self {
            Admission::Uncoordinated => grab_next(ring, id),
            Admission::Arbitrated(arbiter) => {
                // Hungry actors never touch resources directly here
                if arbiter.enqueue(id) {
                    ring.log(id, Event::Enqueued);
                }
            }
        }
    }

    /// A blocked actor's turn.
    pub(crate) fn blocked_turn(&mut self, ring: &mut Ring<'_>, id: ActorId) {
        match self {
            Admission::Uncoordinated => retry_blocked(ring, id),
            Admission::Arbitrated(arbiter) => {
                // Not reachable through the arbiter; fold back into the queue
                let actor = ring.actor_mut(id);
                actor.clear_wait();
                actor.set_state(ActorState::Hungry);
                if arbiter.enqueue(id) {
                    ring.log(id, Event::Enqueued);
                }
            }
        }
    }

    /// Called after an eating actor released its resources.
    pub(crate) fn finished(&mut self, id: ActorId) {
        if let Admission::Arbitrated(arbiter) = self {
            arbiter.finish(id);
        }
    }

    /// Tries to seat the queue head. Returns the admitted actor.
    pub(crate) fn admit_next(&mut self, ring: &mut Ring<'_>) -> Option<ActorId> {
        let Admission::Arbitrated(arbiter) = self else {
            return None;
        };
        let head = arbiter.head()?;

        if ring.actor(head).state() != ActorState::Hungry {
            // Stale entry (e.g. the actor was recovered out of band)
            arbiter.pop_head();
            return None;
        }
        if !arbiter.can_admit(head) {
            return None;
        }

        let (left, right) = {
            let actor = ring.actor(head);
            (actor.left(), actor.right())
        };
        if !ring.resource(left).is_free() || !ring.resource(right).is_free() {
            error!(
                "arbiter cleared {} but {} or {} is still held; admission skipped",
                head, left, right
            );
            return None;
        }

        arbiter.pop_head();
        arbiter.seat(head);
        ring.request(head, left);
        ring.request(head, right);
        ring.log(head, Event::Admitted);
        start_eating(ring, head);
        debug!("{} admitted ({} eating)", head, arbiter.eating_count());
        Some(head)
    }
}

/// Mutable view over the arenas for one tick.
pub(crate) struct Ring<'a> {
    pub actors: &'a mut [Actor],
    pub resources: &'a mut [ResourceUnit],
    pub log: &'a mut EventLog,
    pub step: u64,
}

impl Ring<'_> {
    pub fn actor(&self, id: ActorId) -> &Actor {
        &self.actors[id.index()]
    }

    pub fn actor_mut(&mut self, id: ActorId) -> &mut Actor {
        &mut self.actors[id.index()]
    }

    pub fn resource(&self, id: ResourceId) -> &ResourceUnit {
        &self.resources[id.index()]
    }

    pub fn log(&mut self, id: ActorId, event: Event) {
        self.log.push(self.step, Some(id), event);
    }

    /// `actor.request_resource(resource)` across the two arenas.
    pub fn request(&mut self, id: ActorId, resource: ResourceId) -> bool {
        let actor = &mut self.actors[id.index()];
        let unit = &mut self.resources[resource.index()];
        actor.request_resource(unit)
    }

    /// Releases everything `id` holds and wakes anyone waiting on it.
    pub fn release_all(&mut self, id: ActorId) -> HeldSet {
        let released = self.actors[id.index()].release_all(self.resources);
        for resource in released.iter() {
            self.wake_waiters(resource);
        }
        released
    }

    /// Clears the await target of every actor waiting on `resource`.
    ///
    /// They stay blocked until their next turn re-targets.
    fn wake_waiters(&mut self, resource: ResourceId) {
        for actor in self.actors.iter_mut() {
            if actor.waiting_for() == Some(resource) {
                actor.clear_wait();
            }
        }
    }
}

fn start_eating(ring: &mut Ring<'_>, id: ActorId) {
    let actor = ring.actor_mut(id);
    actor.clear_wait();
    actor.set_state(ActorState::Eating);
    ring.log(id, Event::StartedEating);
    debug!("{} started eating", id);
}

/// Uncoordinated hungry turn: pick up the next needed resource, left first.
fn grab_next(ring: &mut Ring<'_>, id: ActorId) {
    let Some(target) = ring.actor(id).next_needed() else {
        start_eating(ring, id);
        return;
    };
    attempt(ring, id, target);
}

/// Uncoordinated blocked turn: retry the awaited resource, or the next
/// needed one if the wait was cleared by a release.
fn retry_blocked(ring: &mut Ring<'_>, id: ActorId) {
    let target = {
        let actor = ring.actor(id);
        actor.waiting_for().or_else(|| actor.next_needed())
    };
    match target {
        Some(target) => attempt(ring, id, target),
        None => start_eating(ring, id),
    }
}

fn attempt(ring: &mut Ring<'_>, id: ActorId, target: ResourceId) {
    let was_waiting = ring.actor(id).waiting_for();

    if ring.request(id, target) {
        ring.log(id, Event::Acquired(target));
        debug!("{} acquired {}", id, target);
        if ring.actor(id).holds_both() {
            start_eating(ring, id);
        } else {
            ring.actor_mut(id).set_state(ActorState::Hungry);
        }
    } else {
        ring.actor_mut(id).set_state(ActorState::Blocked);
        if was_waiting != Some(target) {
            ring.log(id, Event::Waiting(target));
            debug!("{} blocked on {}", id, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("arbitrated".parse::<PolicyKind>(), Ok(PolicyKind::Arbitrated));
        assert_eq!("Waiter".parse::<PolicyKind>(), Ok(PolicyKind::Arbitrated));
        assert_eq!("naive".parse::<PolicyKind>(), Ok(PolicyKind::Uncoordinated));
        assert!("chaos".parse::<PolicyKind>().is_err());
        assert_eq!(PolicyKind::Uncoordinated.to_string(), "uncoordinated");
    }

    #[test]
    fn test_arbiter_capacity() {
        assert_eq!(Arbiter::new(2).max_concurrent(), 1);
        assert_eq!(Arbiter::new(3).max_concurrent(), 1);
        assert_eq!(Arbiter::new(5).max_concurrent(), 2);
        assert_eq!(Arbiter::new(6).max_concurrent(), 3);
    }

    #[test]
    fn test_enqueue_idempotent() {
        let mut arbiter = Arbiter::new(5);
        assert!(arbiter.enqueue(ActorId(1)));
        assert!(!arbiter.enqueue(ActorId(1)));
        assert!(arbiter.enqueue(ActorId(3)));
        assert_eq!(arbiter.queue().collect::<Vec<_>>(), vec![ActorId(1), ActorId(3)]);
        assert!(!arbiter.enqueue(ActorId(9)));
    }

    #[test]
    fn test_neighbours_wrap() {
        let arbiter = Arbiter::new(5);
        assert_eq!(arbiter.neighbours(ActorId(0)), (ActorId(4), ActorId(1)));
        assert_eq!(arbiter.neighbours(ActorId(4)), (ActorId(3), ActorId(0)));

        let pair = Arbiter::new(2);
        assert_eq!(pair.neighbours(ActorId(0)), (ActorId(1), ActorId(1)));
    }

    #[test]
    fn test_neighbour_exclusion() {
        let mut arbiter = Arbiter::new(5);
        arbiter.seat(ActorId(0));
        assert!(!arbiter.can_admit(ActorId(1)));
        assert!(!arbiter.can_admit(ActorId(4)));
        assert!(arbiter.can_admit(ActorId(2)));

        arbiter.seat(ActorId(2));
        // Capacity reached
        assert!(!arbiter.can_admit(ActorId(3)));

        assert!(arbiter.finish(ActorId(2)));
        assert!(!arbiter.finish(ActorId(2)));
        assert!(arbiter.can_admit(ActorId(3)));
    }

    fn ring_parts(n: usize) -> (Vec<Actor>, Vec<ResourceUnit>, EventLog) {
        let actors = (0..n).map(|i| Actor::new(ActorId::from_index(i), n)).collect();
        let resources = (0..n)
            .map(|i| ResourceUnit::new(ResourceId::from_index(i)))
            .collect();
        (actors, resources, EventLog::new(32))
    }

    #[test]
    fn test_uncoordinated_left_then_right() {
        let (mut actors, mut resources, mut log) = ring_parts(5);
        let mut ring = Ring {
            actors: &mut actors,
            resources: &mut resources,
            log: &mut log,
            step: 0,
        };
        let mut admission = Admission::new(PolicyKind::Uncoordinated, 5);
        ring.actor_mut(ActorId(2)).set_state(ActorState::Hungry);

        admission.hungry_turn(&mut ring, ActorId(2));
        assert!(ring.actor(ActorId(2)).holds(ResourceId(2)));
        assert_eq!(ring.actor(ActorId(2)).state(), ActorState::Hungry);

        admission.hungry_turn(&mut ring, ActorId(2));
        assert_eq!(ring.actor(ActorId(2)).state(), ActorState::Eating);
        assert_eq!(ring.resource(ResourceId(2)).holder(), Some(ActorId(2)));
        assert_eq!(ring.resource(ResourceId(3)).holder(), Some(ActorId(2)));
    }

    #[test]
    fn test_uncoordinated_blocks_keeping_left() {
        let (mut actors, mut resources, mut log) = ring_parts(5);
        let mut ring = Ring {
            actors: &mut actors,
            resources: &mut resources,
            log: &mut log,
            step: 0,
        };
        let mut admission = Admission::new(PolicyKind::Uncoordinated, 5);
        ring.request(ActorId(3), ResourceId(3));
        ring.actor_mut(ActorId(2)).set_state(ActorState::Hungry);

        admission.hungry_turn(&mut ring, ActorId(2));
        admission.hungry_turn(&mut ring, ActorId(2));

        let actor = ring.actor(ActorId(2));
        assert_eq!(actor.state(), ActorState::Blocked);
        assert_eq!(actor.waiting_for(), Some(ResourceId(3)));
        assert!(actor.holds(ResourceId(2)));

        // Holder releases: the wait is cleared, next turn picks it up
        ring.release_all(ActorId(3));
        assert_eq!(ring.actor(ActorId(2)).waiting_for(), None);
        admission.blocked_turn(&mut ring, ActorId(2));
        assert_eq!(ring.actor(ActorId(2)).state(), ActorState::Eating);
    }

    #[test]
    fn test_blocked_on_left_resumes_hungry() {
        let (mut actors, mut resources, mut log) = ring_parts(5);
        let mut ring = Ring {
            actors: &mut actors,
            resources: &mut resources,
            log: &mut log,
            step: 0,
        };
        let mut admission = Admission::new(PolicyKind::Uncoordinated, 5);
        ring.request(ActorId(1), ResourceId(2));
        ring.actor_mut(ActorId(2)).set_state(ActorState::Hungry);

        admission.hungry_turn(&mut ring, ActorId(2));
        let actor = ring.actor(ActorId(2));
        assert_eq!(actor.state(), ActorState::Blocked);
        assert_eq!(actor.waiting_for(), Some(ResourceId(2)));
        assert!(actor.held().is_empty());

        ring.release_all(ActorId(1));
        assert_eq!(ring.actor(ActorId(2)).waiting_for(), None);
        assert_eq!(ring.actor(ActorId(2)).state(), ActorState::Blocked);

        admission.blocked_turn(&mut ring, ActorId(2));
        let actor = ring.actor(ActorId(2));
        assert_eq!(actor.state(), ActorState::Hungry);
        assert_eq!(actor.waiting_for(), None);
        assert!(actor.holds(ResourceId(2)));
        assert!(!actor.holds(ResourceId(3)));
        assert_eq!(ring.resource(ResourceId(2)).holder(), Some(ActorId(2)));
    }

    #[test]
    fn test_arbitrated_hungry_turn_only_queues() {
        let (mut actors, mut resources, mut log) = ring_parts(4);
        let mut ring = Ring {
            actors: &mut actors,
            resources: &mut resources,
            log: &mut log,
            step: 0,
        };
        let mut admission = Admission::new(PolicyKind::Arbitrated, 4);
        ring.actor_mut(ActorId(1)).set_state(ActorState::Hungry);

        admission.hungry_turn(&mut ring, ActorId(1));
        admission.hungry_turn(&mut ring, ActorId(1));
        assert!(ring.actor(ActorId(1)).held().is_empty());
        let arbiter = admission.arbiter().unwrap();
        assert_eq!(arbiter.queue().collect::<Vec<_>>(), vec![ActorId(1)]);

        assert_eq!(admission.admit_next(&mut ring), Some(ActorId(1)));
        let actor = ring.actor(ActorId(1));
        assert_eq!(actor.state(), ActorState::Eating);
        assert!(actor.holds_both());
        assert!(admission.arbiter().unwrap().is_eating(ActorId(1)));
    }
}
