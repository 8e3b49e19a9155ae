//! Symposium Deterministic Simulation Harness
//!
//! This crate drives the allocation core under controlled conditions:
//! every engine draws from a seeded [`SimContext`], so any failing run is
//! reproducible from its seed number alone.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   ScenarioRunner                     │
//! │  ┌──────────────┐    ┌───────────────────────────┐   │
//! │  │  SimContext  │───►│  SimulationEngine         │   │
//! │  │  (ChaCha8)   │    │  actors ◄─ids─► resources │   │
//! │  └──────────────┘    └─────────────┬─────────────┘   │
//! │                                    │ every tick      │
//! │                     ┌──────────────▼─────────────┐   │
//! │                     │ invariants · metrics ·     │   │
//! │                     │ SimExport frames           │   │
//! │                     └────────────────────────────┘   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use symposium_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42, 5).with_ticks(200);
//! let result = runner.run(ScenarioId::ArbitratedRing);
//! assert!(result.passed);
//! ```

mod context;
mod exporter;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use exporter::{ActorFrame, SimExport, SimFrame};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
