//! Named simulation scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SYM-001: Everyone grabs left first and the ring locks up
    ClassicDeadlock,

    /// SYM-002: Central arbiter under steady load
    ArbitratedRing,

    /// SYM-003: The smallest ring, under both policies
    Pair,

    /// SYM-004: Record, rewind and replay a history
    TimeTravel,

    /// SYM-005: All actors forced hungry at once
    ForcedHunger,

    /// SYM-006: 64-actor soak under both policies
    LargeRing,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::ClassicDeadlock,
            ScenarioId::ArbitratedRing,
            ScenarioId::Pair,
            ScenarioId::TimeTravel,
            ScenarioId::ForcedHunger,
            ScenarioId::LargeRing,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::ClassicDeadlock => "classic_deadlock",
            ScenarioId::ArbitratedRing => "arbitrated_ring",
            ScenarioId::Pair => "pair",
            ScenarioId::TimeTravel => "time_travel",
            ScenarioId::ForcedHunger => "forced_hunger",
            ScenarioId::LargeRing => "large_ring",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::ClassicDeadlock => {
                "Uncoordinated ring, always hungry: must deadlock, recover and keep eating"
            }
            ScenarioId::ArbitratedRing => {
                "Arbitrated ring: no deadlock, never more than floor(N/2) eaters"
            }
            ScenarioId::Pair => "Two actors sharing two resources under both policies",
            ScenarioId::TimeTravel => "Rewind half a recorded run and replay it verbatim",
            ScenarioId::ForcedHunger => "Every actor forced hungry at t=0; all of them must eat",
            ScenarioId::LargeRing => "64 actors under both policies, invariants every tick",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic_deadlock" | "classicdeadlock" | "sym-001" => Ok(ScenarioId::ClassicDeadlock),
            "arbitrated_ring" | "arbitratedring" | "sym-002" => Ok(ScenarioId::ArbitratedRing),
            "pair" | "sym-003" => Ok(ScenarioId::Pair),
            "time_travel" | "timetravel" | "sym-004" => Ok(ScenarioId::TimeTravel),
            "forced_hunger" | "forcedhunger" | "sym-005" => Ok(ScenarioId::ForcedHunger),
            "large_ring" | "largering" | "sym-006" => Ok(ScenarioId::LargeRing),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
