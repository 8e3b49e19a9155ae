//! Scripted entropy for exact, hand-written scenarios.

use crate::context::{fixed_outcome, Entropy};
use std::collections::VecDeque;

/// Replays a fixed script of outcomes.
///
/// `chance` pops from the coin script and `pick` from the pick script.
/// When a script runs dry the fallback value is used: coins fall back to
/// `default_coin`, picks fall back to index 0. Probabilities of exactly 0
/// or 1 never consume from the script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEntropy {
    coins: VecDeque<bool>,
    picks: VecDeque<usize>,
    default_coin: bool,
}

impl ScriptedEntropy {
    /// Every coin lands `outcome`; every pick returns 0.
    pub fn constant(outcome: bool) -> Self {
        Self {
            default_coin: outcome,
            ..Default::default()
        }
    }

    /// Queues coin outcomes.
    pub fn with_coins(mut self, coins: impl IntoIterator<Item = bool>) -> Self {
        self.coins.extend(coins);
        self
    }

    /// Queues pick outcomes. Each is reduced modulo the requested length.
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    /// Remaining scripted coins.
    pub fn coins_left(&self) -> usize {
        self.coins.len()
    }
}

impl Entropy for ScriptedEntropy {
    fn chance(&mut self, p: f64) -> bool {
        if let Some(outcome) = fixed_outcome(p) {
            return outcome;
        }
        self.coins.pop_front().unwrap_or(self.default_coin)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().map(|i| i % len).unwrap_or(0)
    }

    fn seed(&self) -> u64 {
        0
    }
}
