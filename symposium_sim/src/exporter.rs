//! JSON exporter for external viewers.
//!
//! Exports per-tick frames of the ring so a renderer can replay a run
//! without linking against the engine.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use symposium_core::{ActorState, PolicyKind, SimulationState};
use uuid::Uuid;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Completed ticks at capture time
    pub step: u64,

    /// Policy of the engine that produced the frame
    pub policy: PolicyKind,

    /// Per-actor state
    pub actors: Vec<ActorFrame>,

    /// Holder per resource, indexed by resource id
    pub holders: Vec<Option<u32>>,

    /// Arbiter queue, head first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub queue: Vec<u32>,

    /// Arbiter eating set
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub eating: Vec<u32>,

    /// Log lines emitted during the tick
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<String>,
}

impl SimFrame {
    /// Captures the frame for the tick that just completed.
    pub fn from_state(state: &SimulationState) -> Self {
        let actors = state
            .actors()
            .iter()
            .map(|a| ActorFrame {
                id: a.id().0,
                state: a.state(),
                held: a.held().iter().map(|r| r.0).collect(),
                waiting_for: a.waiting_for().map(|r| r.0),
            })
            .collect();
        let holders = state
            .resources()
            .iter()
            .map(|r| r.holder().map(|a| a.0))
            .collect();
        let (queue, eating) = match state.arbiter() {
            Some(arbiter) => (
                arbiter.queue().map(|a| a.0).collect(),
                arbiter.currently_eating().map(|a| a.0).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let events = match state.step().checked_sub(1) {
            Some(tick) => state.log().at_step(tick).map(|e| e.to_string()).collect(),
            None => Vec::new(),
        };

        Self {
            step: state.step(),
            policy: state.policy(),
            actors,
            holders,
            queue,
            eating,
            events,
        }
    }
}

/// Actor frame data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorFrame {
    pub id: u32,
    pub state: ActorState,
    pub held: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub waiting_for: Option<u32>,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Run identifier, derived from the seed
    pub run_id: Uuid,

    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            run_id: run_id_from_seed(seed),
            scenario: scenario.to_string(),
            seed,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Deterministic UUID for a seed, so re-running a seed overwrites the
/// same run in a viewer.
fn run_id_from_seed(seed: u64) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
    Uuid::from_bytes(bytes)
}
