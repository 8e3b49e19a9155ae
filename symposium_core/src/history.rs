//! Snapshots and time travel.
//!
//! A [`Snapshot`] is a plain value copy of the state: the arenas hold ids,
//! not references, so a clone shares nothing with the live state and later
//! mutation cannot leak into recorded history.
//!
//! Playback never re-simulates. Stepping back (or forward inside the
//! recorded range) restores a captured snapshot verbatim and does not touch
//! the entropy source. Only stepping forward past the newest snapshot runs
//! a real tick.

use crate::engine::SimulationEngine;
use crate::state::SimulationState;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use symposium_env::Entropy;
use tracing::debug;

/// Default number of snapshots kept before the oldest is dropped.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10_000;

/// Deep copy of the full simulation state at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    state: SimulationState,
}

impl Snapshot {
    /// Copies `state`.
    pub fn capture(state: &SimulationState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Tick the snapshot was taken at.
    pub fn step(&self) -> u64 {
        self.state.step()
    }

    /// The captured state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }
}

/// How a forward step was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Restored an already recorded snapshot
    Replayed,
    /// Ran a new tick and recorded it
    Simulated,
}

/// Records snapshots and moves the engine through them.
///
/// Only [`tick`](Self::tick) and [`step_forward`](Self::step_forward) record
/// on their own. After an out-of-band change such as
/// [`SimulationEngine::force_hungry`] call [`record`](Self::record); after
/// [`SimulationEngine::reset`] call [`reset`](Self::reset) to drop the old
/// timeline.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: VecDeque<Snapshot>,
    cursor: usize,
    capacity: usize,
}

impl HistoryManager {
    /// Starts a history whose first entry is the engine's current state.
    pub fn new<E: Entropy>(engine: &SimulationEngine<E>) -> Self {
        Self::with_capacity(engine, DEFAULT_HISTORY_CAPACITY)
    }

    /// Like [`new`](Self::new) with an explicit capacity (at least 1).
    pub fn with_capacity<E: Entropy>(engine: &SimulationEngine<E>, capacity: usize) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(engine.snapshot());
        Self {
            snapshots,
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Discards every recorded snapshot and starts over from the engine's
    /// current state.
    pub fn reset<E: Entropy>(&mut self, engine: &SimulationEngine<E>) {
        self.snapshots.clear();
        self.snapshots.push_back(engine.snapshot());
        self.cursor = 0;
        debug!("History restarted at step {}", engine.state().step());
    }

    /// Records the engine's current state after the cursor.
    ///
    /// Any recorded future beyond the cursor is discarded first.
    pub fn record<E: Entropy>(&mut self, engine: &SimulationEngine<E>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(engine.snapshot());
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Runs one live tick and records it.
    pub fn tick<E: Entropy>(&mut self, engine: &mut SimulationEngine<E>) {
        engine.step();
        self.record(engine);
    }

    /// Restores the previous snapshot. Returns false at the oldest one.
    pub fn step_back<E: Entropy>(&mut self, engine: &mut SimulationEngine<E>) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        engine.restore(&self.snapshots[self.cursor]);
        debug!("Rewound to step {}", self.snapshots[self.cursor].step());
        true
    }

    /// Replays the next recorded snapshot, or simulates a new tick when
    /// the cursor is at the newest one.
    pub fn step_forward<E: Entropy>(&mut self, engine: &mut SimulationEngine<E>) -> Playback {
        if self.cursor + 1 < self.snapshots.len() {
            self.cursor += 1;
            engine.restore(&self.snapshots[self.cursor]);
            Playback::Replayed
        } else {
            self.tick(engine);
            Playback::Simulated
        }
    }

    /// Restores the snapshot at `index`. Returns false if out of range.
    pub fn jump_to<E: Entropy>(&mut self, engine: &mut SimulationEngine<E>, index: usize) -> bool {
        match self.snapshots.get(index) {
            Some(snapshot) => {
                engine.restore(snapshot);
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.cursor]
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when the cursor sits on the newest snapshot.
    pub fn is_at_head(&self) -> bool {
        self.cursor + 1 == self.snapshots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::policy::PolicyKind;
    use symposium_env::OsEntropy;

    fn engine(policy: PolicyKind) -> SimulationEngine<OsEntropy> {
        let config = EngineConfig::new(5, policy)
            .with_hunger_probability(0.6)
            .with_finish_probability(0.4);
        SimulationEngine::new(config, OsEntropy::seeded(11)).unwrap()
    }

    #[test]
    fn test_restore_roundtrip() {
        let mut engine = engine(PolicyKind::Arbitrated);
        for _ in 0..30 {
            engine.step();
        }
        let snapshot = engine.snapshot();
        for _ in 0..30 {
            engine.step();
        }
        assert_ne!(engine.state(), snapshot.state());

        engine.restore(&snapshot);
        assert_eq!(engine.state(), snapshot.state());
        assert_eq!(engine.state().step(), 30);
    }

    #[test]
    fn test_snapshot_does_not_alias() {
        let mut engine = engine(PolicyKind::Uncoordinated);
        let before = engine.snapshot();
        let copy = before.clone();
        for _ in 0..25 {
            engine.step();
        }
        assert_eq!(before, copy);
        assert_eq!(before.step(), 0);
    }

    #[test]
    fn test_step_back_and_replay() {
        let mut engine = engine(PolicyKind::Uncoordinated);
        let mut history = HistoryManager::new(&engine);
        for _ in 0..10 {
            history.tick(&mut engine);
        }
        assert_eq!(history.len(), 11);
        let head = engine.state().clone();

        for _ in 0..4 {
            assert!(history.step_back(&mut engine));
        }
        assert_eq!(engine.state().step(), 6);
        assert_eq!(engine.state(), history.get(6).unwrap().state());

        for _ in 0..4 {
            assert_eq!(history.step_forward(&mut engine), Playback::Replayed);
        }
        assert_eq!(engine.state(), &head);
        assert!(history.is_at_head());

        assert_eq!(history.step_forward(&mut engine), Playback::Simulated);
        assert_eq!(engine.state().step(), 11);
        assert_eq!(history.len(), 12);
    }

    #[test]
    fn test_step_back_stops_at_start() {
        let mut engine = engine(PolicyKind::Arbitrated);
        let mut history = HistoryManager::new(&engine);
        assert!(!history.step_back(&mut engine));
        history.tick(&mut engine);
        assert!(history.step_back(&mut engine));
        assert!(!history.step_back(&mut engine));
        assert_eq!(engine.state().step(), 0);
    }

    #[test]
    fn test_record_after_rewind_branches() {
        let mut engine = engine(PolicyKind::Arbitrated);
        let mut history = HistoryManager::new(&engine);
        for _ in 0..5 {
            history.tick(&mut engine);
        }
        history.jump_to(&mut engine, 2);
        history.tick(&mut engine);

        assert_eq!(history.len(), 4);
        assert!(history.is_at_head());
        assert_eq!(history.current().step(), 3);
    }

    #[test]
    fn test_reset_starts_a_new_timeline() {
        let mut engine = engine(PolicyKind::Uncoordinated);
        let mut history = HistoryManager::new(&engine);
        for _ in 0..6 {
            history.tick(&mut engine);
        }

        engine.reset();
        history.reset(&engine);
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.current().state(), engine.state());

        history.tick(&mut engine);
        let steps: Vec<u64> = history.iter().map(Snapshot::step).collect();
        assert_eq!(steps, vec![0, 1]);
        assert!(!history.jump_to(&mut engine, 2));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut engine = engine(PolicyKind::Uncoordinated);
        let mut history = HistoryManager::with_capacity(&engine, 3);
        for _ in 0..5 {
            history.tick(&mut engine);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(0).unwrap().step(), 3);
        assert_eq!(history.cursor(), 2);
        assert!(!history.jump_to(&mut engine, 3));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut engine = engine(PolicyKind::Arbitrated);
        for _ in 0..12 {
            engine.step();
        }
        let snapshot = engine.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
