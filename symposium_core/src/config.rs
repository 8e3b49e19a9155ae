//! Engine configuration.

use crate::error::CoreError;
use crate::policy::PolicyKind;
use serde::{Deserialize, Serialize};

/// Configuration for a simulation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of actors (and resources) in the ring
    pub actor_count: usize,

    /// Admission policy
    pub policy: PolicyKind,

    /// Probability per turn that a thinking actor becomes hungry
    pub hunger_probability: f64,

    /// Probability per turn that an eating actor finishes
    pub finish_probability: f64,

    /// Number of event log entries kept (most recent)
    pub log_capacity: usize,

    /// Recover from a detected deadlock inside `step()`
    pub auto_recover: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            actor_count: 5,
            policy: PolicyKind::Uncoordinated,
            hunger_probability: 0.3,
            finish_probability: 0.3,
            log_capacity: 64,
            auto_recover: true,
        }
    }
}

impl EngineConfig {
    /// Creates a default configuration for `actor_count` actors under `policy`.
    pub fn new(actor_count: usize, policy: PolicyKind) -> Self {
        Self {
            actor_count,
            policy,
            ..Default::default()
        }
    }

    /// Sets the actor count.
    pub fn with_actor_count(mut self, actor_count: usize) -> Self {
        self.actor_count = actor_count;
        self
    }

    /// Sets the admission policy.
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the Thinking -> Hungry probability.
    pub fn with_hunger_probability(mut self, p: f64) -> Self {
        self.hunger_probability = p;
        self
    }

    /// Sets the Eating -> Thinking probability.
    pub fn with_finish_probability(mut self, p: f64) -> Self {
        self.finish_probability = p;
        self
    }

    /// Sets the event log capacity.
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Enables or disables automatic deadlock recovery.
    pub fn with_auto_recover(mut self, auto_recover: bool) -> Self {
        self.auto_recover = auto_recover;
        self
    }

    /// Checks the configuration before an engine is built from it.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.actor_count < 2 {
            return Err(CoreError::InvalidActorCount(self.actor_count));
        }
        check_probability("hunger_probability", self.hunger_probability)?;
        check_probability("finish_probability", self.finish_probability)?;
        if self.log_capacity == 0 {
            return Err(CoreError::InvalidLogCapacity);
        }
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::InvalidProbability { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_small_ring() {
        let config = EngineConfig::default().with_actor_count(1);
        assert_eq!(config.validate(), Err(CoreError::InvalidActorCount(1)));

        let config = EngineConfig::default().with_actor_count(0);
        assert_eq!(config.validate(), Err(CoreError::InvalidActorCount(0)));
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        let config = EngineConfig::default().with_hunger_probability(1.5);
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidProbability { name: "hunger_probability", .. })
        ));

        let config = EngineConfig::default().with_finish_probability(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidProbability { name: "finish_probability", .. })
        ));
    }

    #[test]
    fn test_rejects_empty_log() {
        let config = EngineConfig::default().with_log_capacity(0);
        assert_eq!(config.validate(), Err(CoreError::InvalidLogCapacity));
    }
}
