//! Seed sweeps: scenarios pass for arbitrary seeds and ring sizes.

use proptest::prelude::*;
use symposium_sim::scenarios::ScenarioId;
use symposium_sim::ScenarioRunner;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn arbitrated_scenarios_pass_for_any_seed(seed in any::<u64>(), actors in 2usize..10) {
        let runner = ScenarioRunner::new(seed, actors).with_ticks(300);
        for scenario in [ScenarioId::ArbitratedRing, ScenarioId::Pair, ScenarioId::TimeTravel] {
            let result = runner.run(scenario);
            prop_assert!(result.passed, "{} seed={} actors={}: {:?}", scenario, seed, actors, result.failure_reason);
        }
    }

    #[test]
    fn classic_deadlock_always_recovers(seed in any::<u64>(), actors in 2usize..10) {
        let result = ScenarioRunner::new(seed, actors)
            .with_ticks(250)
            .run(ScenarioId::ClassicDeadlock);
        prop_assert!(result.passed, "seed={} actors={}: {:?}", seed, actors, result.failure_reason);
        prop_assert!(result.metrics.deadlocks_detected >= 1);
    }
}

#[test]
fn test_runs_are_reproducible() {
    let runner = ScenarioRunner::new(2024, 5).with_ticks(400);
    let (first, export_a) = runner.run_with_export(ScenarioId::ForcedHunger);
    let (second, export_b) = runner.run_with_export(ScenarioId::ForcedHunger);

    assert!(first.passed && second.passed);
    assert_eq!(export_a.run_id, export_b.run_id);
    let a = serde_json::to_string(&export_a.frames).unwrap();
    let b = serde_json::to_string(&export_b.frames).unwrap();
    assert_eq!(a, b);
}
