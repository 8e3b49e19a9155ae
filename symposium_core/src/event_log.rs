//! Bounded log of state-machine events.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use symposium_env::{ActorId, ResourceId};

/// Something that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BecameHungry,
    /// Hunger injected from outside the tick loop
    ForcedHungry,
    Acquired(ResourceId),
    Waiting(ResourceId),
    StartedEating,
    FinishedEating,
    Enqueued,
    Admitted,
    DeadlockDetected,
    DeadlockRecovered,
}

/// A single log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Tick the event happened in
    pub step: u64,

    /// Actor concerned (None for ring-wide events)
    pub actor: Option<ActorId>,

    pub event: Event,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>5}] ", self.step)?;
        if let Some(actor) = self.actor {
            write!(f, "{} ", actor)?;
        }
        match self.event {
            Event::BecameHungry => write!(f, "is hungry"),
            Event::ForcedHungry => write!(f, "was made hungry"),
            Event::Acquired(r) => write!(f, "picked up {}", r),
            Event::Waiting(r) => write!(f, "is blocked waiting for {}", r),
            Event::StartedEating => write!(f, "started eating"),
            Event::FinishedEating => write!(f, "finished eating and released its resources"),
            Event::Enqueued => write!(f, "joined the arbiter queue"),
            Event::Admitted => write!(f, "was admitted by the arbiter"),
            Event::DeadlockDetected => write!(f, "deadlock detected: every actor is blocked holding a resource"),
            Event::DeadlockRecovered => write!(f, "was forced to release everything to break the deadlock"),
        }
    }
}

/// Most-recent-K event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Appends an entry, evicting the oldest past capacity.
    pub fn push(&mut self, step: u64, actor: Option<ActorId>, event: Event) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry { step, actor, event });
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries recorded during `step`.
    pub fn at_step(&self, step: u64) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.step == step)
    }

    /// True if any retained entry carries `event`.
    pub fn contains(&self, event: Event) -> bool {
        self.entries.iter().any(|e| e.event == event)
    }
}
