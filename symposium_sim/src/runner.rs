//! Scenario runner - executes simulation scenarios and checks them.

use crate::context::SimContext;
use crate::exporter::{SimExport, SimFrame};
use crate::scenarios::ScenarioId;

use std::collections::BTreeSet;
use symposium_core::{
    check_invariants, ActorId, ActorState, EngineConfig, Event, HistoryManager, Playback,
    PolicyKind, SimulationEngine, SimulationState,
};
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed (across all engines of the scenario)
    pub total_ticks: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Times an actor started eating
    pub meals: u64,

    /// Deadlocks detected
    pub deadlocks_detected: u64,

    /// Deadlocks broken by forced release
    pub deadlocks_recovered: u64,

    /// Most actors eating at the same time
    pub max_concurrent_eaters: usize,

    /// Sum over ticks of the number of blocked actors
    pub blocked_turns: u64,
}

impl ScenarioMetrics {
    /// Folds the metrics of another engine run into these.
    pub fn merge(&mut self, other: &ScenarioMetrics) {
        self.meals += other.meals;
        self.deadlocks_detected += other.deadlocks_detected;
        self.deadlocks_recovered += other.deadlocks_recovered;
        self.max_concurrent_eaters = self.max_concurrent_eaters.max(other.max_concurrent_eaters);
        self.blocked_turns += other.blocked_turns;
    }
}

/// Observes engines tick by tick: invariants, metrics, export frames.
///
/// `run` holds the metrics of the engine currently being observed; they are
/// folded into `metrics` when that run finishes.
struct Recorder<'a> {
    metrics: ScenarioMetrics,
    run: ScenarioMetrics,
    total_ticks: u64,
    fed: BTreeSet<ActorId>,
    export: Option<&'a mut SimExport>,
}

impl<'a> Recorder<'a> {
    fn new(export: Option<&'a mut SimExport>) -> Self {
        Self {
            metrics: ScenarioMetrics::default(),
            run: ScenarioMetrics::default(),
            total_ticks: 0,
            fed: BTreeSet::new(),
            export,
        }
    }

    /// Checks and records the tick that just completed.
    fn observe(&mut self, state: &SimulationState) -> Result<(), String> {
        self.total_ticks += 1;

        check_invariants(state)
            .map_err(|violation| format!("step {}: {}", state.step(), violation))?;

        if let Some(tick) = state.step().checked_sub(1) {
            for entry in state.log().at_step(tick) {
                match entry.event {
                    Event::StartedEating => {
                        self.run.meals += 1;
                        if let Some(actor) = entry.actor {
                            self.fed.insert(actor);
                        }
                    }
                    Event::DeadlockDetected => self.run.deadlocks_detected += 1,
                    Event::DeadlockRecovered => self.run.deadlocks_recovered += 1,
                    _ => {}
                }
            }
        }

        let eating = state.count_in(ActorState::Eating);
        self.run.max_concurrent_eaters = self.run.max_concurrent_eaters.max(eating);
        self.run.blocked_turns += state.count_in(ActorState::Blocked) as u64;

        if let Some(export) = self.export.as_deref_mut() {
            export.add_frame(SimFrame::from_state(state));
        }
        Ok(())
    }

    /// Closes the current run and returns its metrics.
    fn finish_run(&mut self) -> ScenarioMetrics {
        let run = std::mem::take(&mut self.run);
        self.metrics.merge(&run);
        run
    }

    /// Steps `engine` for `ticks` ticks, observing each one. Returns the
    /// metrics of this engine alone.
    fn drive(
        &mut self,
        engine: &mut SimulationEngine<SimContext>,
        ticks: u64,
    ) -> Result<ScenarioMetrics, String> {
        self.finish_run();
        for _ in 0..ticks {
            let state = engine.step();
            self.observe(state)?;
        }
        Ok(self.finish_run())
    }
}

/// Runs scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Number of actors for scenarios that do not fix their own
    num_actors: usize,

    /// Ticks per engine run
    ticks: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, num_actors: usize) -> Self {
        Self {
            seed,
            num_actors: num_actors.max(2),
            ticks: 1000,
        }
    }

    /// Sets the number of ticks per engine run.
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None)
    }

    /// Runs a scenario and captures every tick as an export frame.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(scenario.name(), self.seed);
        let result = self.execute(scenario, Some(&mut export));
        export.finalize(result.passed, result.failure_reason.clone());
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let mut recorder = Recorder::new(export);
        let outcome = match scenario {
            ScenarioId::ClassicDeadlock => self.run_classic_deadlock(&mut recorder),
            ScenarioId::ArbitratedRing => self.run_arbitrated_ring(&mut recorder),
            ScenarioId::Pair => self.run_pair(&mut recorder),
            ScenarioId::TimeTravel => self.run_time_travel(&mut recorder),
            ScenarioId::ForcedHunger => self.run_forced_hunger(&mut recorder),
            ScenarioId::LargeRing => self.run_large_ring(&mut recorder),
        };

        if let Err(reason) = &outcome {
            warn!("{} failed: {}", scenario.name(), reason);
        }
        recorder.finish_run();
        let metrics = recorder.metrics;
        debug!(
            "  meals={} deadlocks={} max_eaters={} blocked_turns={}",
            metrics.meals,
            metrics.deadlocks_detected,
            metrics.max_concurrent_eaters,
            metrics.blocked_turns
        );

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: outcome.is_ok(),
            total_ticks: recorder.total_ticks,
            failure_reason: outcome.err(),
            metrics,
        }
    }

    fn engine(
        &self,
        config: EngineConfig,
        stream: u64,
    ) -> Result<SimulationEngine<SimContext>, String> {
        let context = SimContext::new(self.seed).fork(stream);
        SimulationEngine::new(config, context).map_err(|e| e.to_string())
    }

    /// True when the run is long enough for liveness checks to be fair.
    fn long_enough(&self, actors: usize) -> bool {
        self.ticks >= 20 * actors as u64
    }

    /// SYM-001: ClassicDeadlock - every actor grabs its left resource and
    /// then waits on its right one.
    ///
    /// **Assertion**: a deadlock is detected, recovered, and the ring keeps
    /// producing meals afterwards.
    fn run_classic_deadlock(&self, recorder: &mut Recorder<'_>) -> Result<(), String> {
        let n = self.num_actors;
        let config = EngineConfig::new(n, PolicyKind::Uncoordinated)
            .with_hunger_probability(1.0)
            .with_finish_probability(0.3);
        let mut engine = self.engine(config, 1)?;

        let metrics = recorder.drive(&mut engine, self.ticks)?;

        // The first lap alone takes 3N ticks to lock up
        if self.ticks >= 3 * n as u64 && metrics.deadlocks_detected == 0 {
            return Err("ring never deadlocked".to_string());
        }
        if metrics.deadlocks_recovered != metrics.deadlocks_detected {
            return Err(format!(
                "{} deadlocks detected but {} recovered",
                metrics.deadlocks_detected, metrics.deadlocks_recovered
            ));
        }
        if self.long_enough(n) && metrics.meals == 0 {
            return Err("no actor ate after recovery".to_string());
        }
        Ok(())
    }

    /// SYM-002: ArbitratedRing - central admission under steady load.
    ///
    /// **Assertion**: zero deadlocks, at most floor(N/2) concurrent eaters.
    fn run_arbitrated_ring(&self, recorder: &mut Recorder<'_>) -> Result<(), String> {
        let n = self.num_actors;
        let config = EngineConfig::new(n, PolicyKind::Arbitrated)
            .with_hunger_probability(0.5)
            .with_finish_probability(0.3);
        let mut engine = self.engine(config, 2)?;

        let metrics = recorder.drive(&mut engine, self.ticks)?;
        check_arbitrated(&metrics, n)?;

        if self.long_enough(n) && metrics.meals == 0 {
            return Err("arbiter never admitted anyone".to_string());
        }
        Ok(())
    }

    /// SYM-003: Pair - N=2 under both policies.
    fn run_pair(&self, recorder: &mut Recorder<'_>) -> Result<(), String> {
        for (stream, policy) in PolicyKind::all().into_iter().enumerate() {
            let mut engine = self.engine(EngineConfig::new(2, policy), 10 + stream as u64)?;
            let metrics = recorder.drive(&mut engine, self.ticks)?;
            if policy == PolicyKind::Arbitrated {
                check_arbitrated(&metrics, 2)?;
            }
        }
        Ok(())
    }

    /// SYM-004: TimeTravel - record a run, rewind half of it and replay.
    ///
    /// **Assertion**: every replayed state equals the recorded one, and the
    /// first step past the recording simulates a fresh tick.
    fn run_time_travel(&self, recorder: &mut Recorder<'_>) -> Result<(), String> {
        let ticks = self.ticks.min(2000) as usize;
        let mut engine = self.engine(EngineConfig::new(self.num_actors, PolicyKind::Uncoordinated), 4)?;
        let mut history = HistoryManager::new(&engine);
        let mut recorded = vec![engine.state().clone()];

        for _ in 0..ticks {
            history.tick(&mut engine);
            recorder.observe(engine.state())?;
            recorded.push(engine.state().clone());
        }

        for _ in 0..ticks / 2 {
            history.step_back(&mut engine);
            if engine.state() != &recorded[history.cursor()] {
                return Err(format!("rewind diverged at step {}", history.cursor()));
            }
        }
        while !history.is_at_head() {
            if history.step_forward(&mut engine) != Playback::Replayed {
                return Err("replay inside the recording simulated a tick".to_string());
            }
            if engine.state() != &recorded[history.cursor()] {
                return Err(format!("replay diverged at step {}", history.cursor()));
            }
        }

        if history.step_forward(&mut engine) != Playback::Simulated {
            return Err("stepping past the recording did not simulate".to_string());
        }
        recorder.observe(engine.state())?;
        if engine.state().step() != ticks as u64 + 1 {
            return Err(format!("expected step {}, got {}", ticks + 1, engine.state().step()));
        }
        Ok(())
    }

    /// SYM-005: ForcedHunger - everybody is made hungry at t=0.
    ///
    /// **Assertion**: the FIFO arbiter eventually seats every actor.
    fn run_forced_hunger(&self, recorder: &mut Recorder<'_>) -> Result<(), String> {
        let n = self.num_actors;
        let config = EngineConfig::new(n, PolicyKind::Arbitrated)
            .with_hunger_probability(0.0)
            .with_finish_probability(0.5);
        let mut engine = self.engine(config, 5)?;

        for i in 0..n {
            engine
                .force_hungry(ActorId::from_index(i))
                .map_err(|e| e.to_string())?;
        }
        let metrics = recorder.drive(&mut engine, self.ticks)?;
        check_arbitrated(&metrics, n)?;

        if self.long_enough(n) && recorder.fed.len() != n {
            let starved: Vec<String> = (0..n)
                .map(ActorId::from_index)
                .filter(|id| !recorder.fed.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(format!("starved: {}", starved.join(", ")));
        }
        Ok(())
    }

    /// SYM-006: LargeRing - 64 actors under both policies.
    fn run_large_ring(&self, recorder: &mut Recorder<'_>) -> Result<(), String> {
        const ACTORS: usize = 64;
        for (stream, policy) in PolicyKind::all().into_iter().enumerate() {
            let mut engine = self.engine(EngineConfig::new(ACTORS, policy), 60 + stream as u64)?;
            let metrics = recorder.drive(&mut engine, self.ticks)?;
            if policy == PolicyKind::Arbitrated {
                check_arbitrated(&metrics, ACTORS)?;
            }
        }
        Ok(())
    }
}

fn check_arbitrated(metrics: &ScenarioMetrics, n: usize) -> Result<(), String> {
    if metrics.deadlocks_detected > 0 {
        return Err("arbitrated ring reported a deadlock".to_string());
    }
    if metrics.max_concurrent_eaters > n / 2 {
        return Err(format!(
            "{} concurrent eaters exceeds floor({}/2)",
            metrics.max_concurrent_eaters, n
        ));
    }
    Ok(())
}
