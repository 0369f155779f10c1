//! State Representation
//!
//! Per-episode mutable state of the battery environment and the read-only
//! observation handed to agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EpisodePhase {
    /// Reset and accepting steps
    #[default]
    Ready,
    /// Terminal; only `reset` leaves this phase
    Done,
}

/// Mutable per-episode state, owned by the environment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// Steps taken since reset
    pub step_index: usize,
    /// Stored energy, always within [0, capacity]
    pub stored_energy: f64,
    /// Volume-weighted unit cost of stored energy
    pub cost_basis: f64,
    /// Sum of rewards since reset
    pub cumulative_reward: f64,
    pub phase: EpisodePhase,
}

impl EnvironmentState {
    /// Fresh state for a new episode
    pub fn initial(stored_energy: f64, cost_basis: f64) -> Self {
        Self {
            step_index: 0,
            stored_energy,
            cost_basis,
            cumulative_reward: 0.0,
            phase: EpisodePhase::Ready,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == EpisodePhase::Done
    }
}

/// Read-only view of the environment exposed to agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Steps taken since reset
    pub step_index: usize,
    /// Timestamp of the price the next step will trade at
    pub timestamp: DateTime<Utc>,
    /// Price the next step will trade at
    pub price: f64,
    pub stored_energy: f64,
    /// Stored energy as a fraction of capacity
    pub state_of_charge: f64,
    pub cost_basis: f64,
    /// Recent prices, oldest first, ending with `price`
    pub price_history: Vec<f64>,
}

impl Observation {
    /// Mean of the price history window
    pub fn history_mean(&self) -> f64 {
        if self.price_history.is_empty() {
            return self.price;
        }
        self.price_history.iter().sum::<f64>() / self.price_history.len() as f64
    }

    /// Price change over the last `n` steps of history
    pub fn momentum(&self, n: usize) -> Option<f64> {
        let len = self.price_history.len();
        if len < n + 1 {
            return None;
        }
        Some(self.price_history[len - 1] - self.price_history[len - 1 - n])
    }

    pub fn is_full(&self) -> bool {
        self.state_of_charge >= 1.0 - 1e-9
    }

    pub fn is_empty(&self) -> bool {
        self.stored_energy <= 1e-9
    }
}
