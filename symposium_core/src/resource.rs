//! Exclusive-access resource tokens.

use serde::{Deserialize, Serialize};
use symposium_env::{ActorId, ResourceId};

/// One exclusive-access token shared by two neighbouring actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUnit {
    id: ResourceId,
    holder: Option<ActorId>,
}

impl ResourceUnit {
    /// Creates an unheld resource.
    pub fn new(id: ResourceId) -> Self {
        Self { id, holder: None }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Current holder, if any.
    pub fn holder(&self) -> Option<ActorId> {
        self.holder
    }

    pub fn is_free(&self) -> bool {
        self.holder.is_none()
    }

    /// Marks `actor` as the holder if the resource is free.
    ///
    /// Returns false and leaves the resource untouched otherwise, including
    /// when `actor` already holds it.
    pub fn try_acquire(&mut self, actor: ActorId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(actor);
        true
    }

    /// Clears the holder, but only if it is `actor`.
    ///
    /// Returns whether the release took effect. A release by anyone else
    /// must never clear the real holder's ownership.
    pub fn release(&mut self, actor: ActorId) -> bool {
        if self.holder != Some(actor) {
            return false;
        }
        self.holder = None;
        true
    }
}
