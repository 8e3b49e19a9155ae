//! Actors and their held-resource sets.

use crate::resource::ResourceUnit;
use serde::{Deserialize, Serialize};
use symposium_env::{ActorId, ResourceId};

/// Lifecycle state of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    Thinking,
    Hungry,
    Eating,
    /// Waiting on a resource held by a neighbour
    Blocked,
}

impl ActorState {
    pub fn name(&self) -> &'static str {
        match self {
            ActorState::Thinking => "thinking",
            ActorState::Hungry => "hungry",
            ActorState::Eating => "eating",
            ActorState::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed-capacity set of at most two resource ids.
///
/// An actor only ever competes for its left and right resources, so two
/// slots are enough and the set stays a plain `Copy` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldSet {
    slots: [Option<ResourceId>; 2],
}

impl HeldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.slots.contains(&Some(id))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.slots.len()
    }

    /// Inserts `id`. Returns false if already present or full.
    pub fn insert(&mut self, id: ResourceId) -> bool {
        if self.contains(id) {
            return false;
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(id);
                true
            }
            None => false,
        }
    }

    /// Removes `id`. Returns false if it was not present.
    pub fn remove(&mut self, id: ResourceId) -> bool {
        match self.slots.iter_mut().find(|slot| **slot == Some(id)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Held ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ResourceId> {
        let mut ids = self.slots;
        ids.sort();
        ids.into_iter().flatten()
    }
}

/// One participant at the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    state: ActorState,
    held: HeldSet,
    waiting_for: Option<ResourceId>,

    /// Resource with the same index as the actor
    left: ResourceId,

    /// Resource shared with the next actor around the ring
    right: ResourceId,
}

impl Actor {
    /// Creates a thinking actor seated in a ring of `ring_size`.
    ///
    /// `left = id`, `right = (id + 1) mod ring_size`.
    pub fn new(id: ActorId, ring_size: usize) -> Self {
        let index = id.index();
        Self {
            id,
            state: ActorState::Thinking,
            held: HeldSet::new(),
            waiting_for: None,
            left: ResourceId::from_index(index),
            right: ResourceId::from_index((index + 1) % ring_size),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    pub fn held(&self) -> HeldSet {
        self.held
    }

    pub fn waiting_for(&self) -> Option<ResourceId> {
        self.waiting_for
    }

    pub fn left(&self) -> ResourceId {
        self.left
    }

    pub fn right(&self) -> ResourceId {
        self.right
    }

    pub fn holds(&self, id: ResourceId) -> bool {
        self.held.contains(id)
    }

    /// True when both candidate resources are held.
    pub fn holds_both(&self) -> bool {
        self.held.contains(self.left) && self.held.contains(self.right)
    }

    /// The next resource this actor still needs, left before right.
    pub fn next_needed(&self) -> Option<ResourceId> {
        if !self.held.contains(self.left) {
            Some(self.left)
        } else if !self.held.contains(self.right) {
            Some(self.right)
        } else {
            None
        }
    }

    /// Requests `resource` for this actor.
    ///
    /// On success the id joins the held set and a matching wait is
    /// cleared. On failure the actor records `waiting_for = resource` and
    /// returns false; an actor already holding two resources always fails.
    /// Only the targeted resource and this actor change.
    pub fn request_resource(&mut self, resource: &mut ResourceUnit) -> bool {
        let id = resource.id();
        if self.held.contains(id) {
            self.clear_wait_on(id);
            return true;
        }
        if !self.held.is_full() && resource.try_acquire(self.id) {
            self.held.insert(id);
            self.clear_wait_on(id);
            true
        } else {
            self.waiting_for = Some(id);
            false
        }
    }

    /// Releases `resource`. The held set shrinks only if this actor was
    /// actually the holder.
    pub fn release_resource(&mut self, resource: &mut ResourceUnit) -> bool {
        if resource.release(self.id) {
            self.held.remove(resource.id());
            true
        } else {
            false
        }
    }

    /// Releases every held resource and returns the set that was released.
    pub fn release_all(&mut self, resources: &mut [ResourceUnit]) -> HeldSet {
        let mut released = HeldSet::new();
        let held = self.held;
        for id in held.iter() {
            match resources.get_mut(id.index()) {
                Some(resource) => {
                    if self.release_resource(resource) {
                        released.insert(id);
                    }
                }
                None => {
                    self.held.remove(id);
                }
            }
        }
        released
    }

    pub(crate) fn set_state(&mut self, state: ActorState) {
        self.state = state;
    }

    pub(crate) fn clear_wait(&mut self) {
        self.waiting_for = None;
    }

    fn clear_wait_on(&mut self, id: ResourceId) {
        if self.waiting_for == Some(id) {
            self.waiting_for = None;
        }
    }
}
