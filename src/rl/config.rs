//! RL Configuration
//!
//! Configuration structs for the battery environment, heuristic agents and
//! the training loop.

use serde::{Deserialize, Serialize};

use crate::error::{ArbError, Result};

/// Data source locator that asks for a generated series instead of a file
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// How CHARGE is billed when the battery cannot absorb the full charge rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPolicy {
    /// Bill only the grid energy actually absorbed (stored gain / efficiency)
    #[default]
    Realized,
    /// Bill `charge_rate × price` regardless of available headroom
    Nominal,
}

/// Battery physical and accounting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Maximum stored energy (MWh)
    pub capacity: f64,
    /// Grid energy drawn per CHARGE step (MWh)
    pub charge_rate: f64,
    /// Stored energy released per DISCHARGE step (MWh)
    pub discharge_rate: f64,
    /// Charging efficiency in (0, 1]
    pub efficiency: f64,
    /// Stored energy at reset (MWh)
    pub initial_energy: f64,
    /// Unit cost assigned to the initial inventory ($/MWh)
    pub cost_basis: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            charge_rate: 2.0,
            discharge_rate: 2.0,
            efficiency: 0.9,
            initial_energy: 0.0,
            cost_basis: 40.0,
        }
    }
}

impl BatteryConfig {
    fn collect_errors(&self, errors: &mut Vec<String>) {
        if !(self.capacity.is_finite() && self.capacity > 0.0) {
            errors.push(format!("capacity must be positive, got {}", self.capacity));
        }
        if !(self.charge_rate.is_finite() && self.charge_rate > 0.0) {
            errors.push(format!(
                "charge_rate must be positive, got {}",
                self.charge_rate
            ));
        }
        if !(self.discharge_rate.is_finite() && self.discharge_rate > 0.0) {
            errors.push(format!(
                "discharge_rate must be positive, got {}",
                self.discharge_rate
            ));
        }
        if !(self.efficiency > 0.0 && self.efficiency <= 1.0) {
            errors.push(format!(
                "efficiency must be in (0, 1], got {}",
                self.efficiency
            ));
        }
        if !(self.initial_energy >= 0.0 && self.initial_energy <= self.capacity) {
            errors.push(format!(
                "initial_energy must be within [0, {}], got {}",
                self.capacity, self.initial_energy
            ));
        }
        if !(self.cost_basis.is_finite() && self.cost_basis >= 0.0) {
            errors.push(format!(
                "cost_basis must be finite and non-negative, got {}",
                self.cost_basis
            ));
        }
    }
}

/// Battery environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Maximum steps per episode
    pub max_steps: usize,
    /// Price dataset locator (file path or `synthetic`)
    pub data_source: String,
    /// Number of recent prices exposed in each observation
    pub history_window: usize,
    /// Charge billing policy
    pub settlement: SettlementPolicy,
    /// Battery parameters
    pub battery: BatteryConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            max_steps: 168,
            data_source: SYNTHETIC_SOURCE.to_string(),
            history_window: 24,
            settlement: SettlementPolicy::default(),
            battery: BatteryConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Validate all parameters, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.max_steps == 0 {
            errors.push("max_steps must be positive".to_string());
        }
        if self.history_window == 0 {
            errors.push("history_window must be at least 1".to_string());
        }
        self.battery.collect_errors(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ArbError::Configuration(errors.join("; ")))
        }
    }
}

/// Parameters for the rule-based agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Relative margin around the cost basis for the price-vs-cost agent
    pub cost_margin: f64,
    /// Relative band around the moving average for the moving-average agent
    pub moving_average_band: f64,
    /// Seed for the random baseline
    pub random_seed: u64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            cost_margin: 0.1,
            moving_average_band: 0.05,
            random_seed: 7,
        }
    }
}

/// Training loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training episodes
    pub episodes: usize,
    /// Q-learning step size
    pub learning_rate: f64,
    /// Discount factor (gamma)
    pub discount: f64,
    /// Exploration rate (epsilon for epsilon-greedy)
    pub exploration_rate: f64,
    /// Exploration decay per episode
    pub exploration_decay: f64,
    /// Minimum exploration rate
    pub exploration_min: f64,
    /// Replay buffer capacity
    pub replay_capacity: usize,
    /// Transitions replayed after each live update
    pub replay_batch: usize,
    /// Buckets for price relative to the recent mean
    pub price_bins: usize,
    /// Buckets for state of charge
    pub soc_bins: usize,
    /// Checkpoint save frequency (episodes, 0 = only at the end)
    pub checkpoint_frequency: usize,
    /// Path for saving checkpoints
    pub checkpoint_dir: String,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    /// Progress log frequency (episodes)
    pub log_every: usize,
    /// Seed for exploration and episode start offsets
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            learning_rate: 0.1,
            discount: 0.99,
            exploration_rate: 1.0,
            exploration_decay: 0.99,
            exploration_min: 0.05,
            replay_capacity: 10_000,
            replay_batch: 16,
            price_bins: 8,
            soc_bins: 5,
            checkpoint_frequency: 100,
            checkpoint_dir: "./checkpoints".to_string(),
            max_checkpoints: 5,
            log_every: 50,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Validate hyperparameters
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            errors.push(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            errors.push(format!("discount must be in [0, 1], got {}", self.discount));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate)
            || !(0.0..=1.0).contains(&self.exploration_min)
        {
            errors.push("exploration rates must be in [0, 1]".to_string());
        }
        if !(self.exploration_decay > 0.0 && self.exploration_decay <= 1.0) {
            errors.push(format!(
                "exploration_decay must be in (0, 1], got {}",
                self.exploration_decay
            ));
        }
        if self.price_bins < 2 || self.soc_bins < 2 {
            errors.push("price_bins and soc_bins must be at least 2".to_string());
        }
        if self.replay_capacity == 0 {
            errors.push("replay_capacity must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ArbError::Configuration(errors.join("; ")))
        }
    }
}
