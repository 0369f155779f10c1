//! Battery Arbitrage Environment
//!
//! Gym-like step/reset interface over a historical price series. The
//! environment is fully deterministic: for a given price series, config and
//! action sequence it reproduces the same observations, rewards and flags.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::PriceSeries;
use crate::error::{ArbError, Result};
use crate::rl::config::EnvironmentConfig;
use crate::rl::core::{
    settle, updated_cost_basis, Action, EnvironmentState, EpisodePhase, Observation,
};

/// Result of taking a step in the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// New observation after action
    pub observation: Observation,
    /// Revenue minus cost for this step
    pub reward: f64,
    /// Whether episode is done
    pub done: bool,
    /// Whether the price series ran out before `max_steps`
    pub truncated: bool,
    /// Additional info
    pub info: StepInfo,
}

/// Bookkeeping for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Timestamp of the price traded
    pub timestamp: DateTime<Utc>,
    /// Price traded
    pub price: f64,
    pub action: Action,
    pub energy_bought: f64,
    pub energy_stored: f64,
    pub energy_sold: f64,
    pub cost: f64,
    pub revenue: f64,
    /// Stored energy after the step
    pub stored_energy: f64,
    pub cumulative_reward: f64,
}

/// Single-battery arbitrage environment
///
/// One instance is driven by one agent at a time. Parallel rollouts clone the
/// environment; clones share the price series but never the episode state.
#[derive(Debug, Clone)]
pub struct BatteryEnvironment {
    config: EnvironmentConfig,
    prices: Arc<PriceSeries>,
    state: EnvironmentState,
    /// Price index of step 0 for the current episode
    start_offset: usize,
}

impl BatteryEnvironment {
    /// Create a new environment, failing fast on invalid configuration
    pub fn new(config: EnvironmentConfig, prices: Arc<PriceSeries>) -> Result<Self> {
        config.validate()?;

        if prices.is_empty() {
            return Err(ArbError::Configuration(format!(
                "price series '{}' is empty",
                prices.source()
            )));
        }

        if prices.len() < config.max_steps {
            warn!(
                "Price series '{}' has {} points but max_steps is {}; episodes will be truncated",
                prices.source(),
                prices.len(),
                config.max_steps
            );
        }

        let state = EnvironmentState::initial(
            config.battery.initial_energy,
            config.battery.cost_basis,
        );

        Ok(Self {
            config,
            prices,
            state,
            start_offset: 0,
        })
    }

    /// Reset the environment for a new episode starting at the first price
    pub fn reset(&mut self) -> Observation {
        self.start_offset = 0;
        self.reset_state();
        self.observation()
    }

    /// Reset the environment for a new episode starting at price `offset`
    pub fn reset_at(&mut self, offset: usize) -> Result<Observation> {
        if offset >= self.prices.len() {
            return Err(ArbError::OutOfRange(format!(
                "start offset {} beyond price series of length {}",
                offset,
                self.prices.len()
            )));
        }

        self.start_offset = offset;
        self.reset_state();
        Ok(self.observation())
    }

    fn reset_state(&mut self) {
        self.state = EnvironmentState::initial(
            self.config.battery.initial_energy,
            self.config.battery.cost_basis,
        );
        debug!(
            "Episode reset: offset={}, length={}, energy={:.3}",
            self.start_offset,
            self.episode_length(),
            self.state.stored_energy
        );
    }

    /// Take a step in the environment
    pub fn step(&mut self, action: Action) -> Result<StepResult> {
        if self.state.is_done() {
            return Err(ArbError::OutOfRange(format!(
                "step called after episode ended at step {}; reset required",
                self.state.step_index
            )));
        }

        let index = self.start_offset + self.state.step_index;
        let point = *self.prices.point_at(index).ok_or_else(|| {
            ArbError::OutOfRange(format!(
                "price series '{}' exhausted at index {}",
                self.prices.source(),
                index
            ))
        })?;

        let battery = &self.config.battery;
        let stored_before = self.state.stored_energy;
        let settlement = settle(
            battery,
            self.config.settlement,
            stored_before,
            action,
            point.price,
        );
        let reward = settlement.reward();

        self.state.cost_basis = updated_cost_basis(
            self.state.cost_basis,
            stored_before,
            &settlement,
            battery.cost_basis,
        );
        self.state.stored_energy = settlement.stored_energy;
        self.state.cumulative_reward += reward;
        self.state.step_index += 1;

        let max_reached = self.state.step_index >= self.config.max_steps;
        let exhausted = self.start_offset + self.state.step_index >= self.prices.len();
        let done = max_reached || exhausted;
        let truncated = exhausted && !max_reached;

        if done {
            self.state.phase = EpisodePhase::Done;
            if truncated {
                warn!(
                    "Price series exhausted after {} of {} steps",
                    self.state.step_index, self.config.max_steps
                );
            }
            debug!(
                "Episode done: steps={}, reward={:.2}, energy={:.3}",
                self.state.step_index, self.state.cumulative_reward, self.state.stored_energy
            );
        }

        let info = StepInfo {
            timestamp: point.timestamp,
            price: point.price,
            action,
            energy_bought: settlement.energy_bought,
            energy_stored: settlement.energy_stored,
            energy_sold: settlement.energy_sold,
            cost: settlement.cost,
            revenue: settlement.revenue,
            stored_energy: self.state.stored_energy,
            cumulative_reward: self.state.cumulative_reward,
        };

        Ok(StepResult {
            observation: self.observation(),
            reward,
            done,
            truncated,
            info,
        })
    }

    /// Step with a raw action index.
    ///
    /// An index outside the action space ends the episode.
    pub fn step_raw(&mut self, index: usize) -> Result<StepResult> {
        if self.state.is_done() {
            return self.step(Action::Hold);
        }

        match Action::from_index(index) {
            Ok(action) => self.step(action),
            Err(e) => {
                self.state.phase = EpisodePhase::Done;
                Err(e)
            }
        }
    }

    /// Current observation. Once the series is exhausted it repeats the last price.
    pub fn observation(&self) -> Observation {
        let last = self.prices.len() - 1;
        let index = (self.start_offset + self.state.step_index).min(last);
        let (timestamp, price) = self
            .prices
            .point_at(index)
            .map(|p| (p.timestamp, p.price))
            .unwrap_or_default();

        Observation {
            step_index: self.state.step_index,
            timestamp,
            price,
            stored_energy: self.state.stored_energy,
            state_of_charge: self.state.stored_energy / self.config.battery.capacity,
            cost_basis: self.state.cost_basis,
            price_history: self.prices.window(index, self.config.history_window),
        }
    }

    /// Steps the current episode will last
    pub fn episode_length(&self) -> usize {
        self.config
            .max_steps
            .min(self.prices.len() - self.start_offset)
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn state(&self) -> &EnvironmentState {
        &self.state
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn prices(&self) -> &Arc<PriceSeries> {
        &self.prices
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;
    use crate::rl::config::BatteryConfig;

    fn series(prices: &[f64]) -> Arc<PriceSeries> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                PricePoint::new(DateTime::from_timestamp(i as i64 * 3600, 0).unwrap(), *p)
            })
            .collect();
        Arc::new(PriceSeries::new(points, "test").unwrap())
    }

    fn config(max_steps: usize) -> EnvironmentConfig {
        EnvironmentConfig {
            max_steps,
            history_window: 3,
            battery: BatteryConfig {
                capacity: 10.0,
                charge_rate: 2.0,
                discharge_rate: 2.0,
                efficiency: 1.0,
                initial_energy: 0.0,
                cost_basis: 0.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        let mut bad = config(3);
        bad.battery.discharge_rate = 0.0;
        let err = BatteryEnvironment::new(bad, series(&[1.0])).unwrap_err();
        assert!(matches!(err, ArbError::Configuration(_)));
    }

    #[test]
    fn test_reset_observation() {
        let mut env = BatteryEnvironment::new(config(3), series(&[5.0, 6.0, 7.0])).unwrap();
        let obs = env.reset();

        assert_eq!(obs.step_index, 0);
        assert_eq!(obs.price, 5.0);
        assert_eq!(obs.stored_energy, 0.0);
        assert_eq!(obs.price_history, vec![5.0]);
    }

    #[test]
    fn test_observation_history_window() {
        let mut env =
            BatteryEnvironment::new(config(5), series(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        env.reset();
        env.step(Action::Hold).unwrap();
        env.step(Action::Hold).unwrap();
        let result = env.step(Action::Hold).unwrap();

        assert_eq!(result.observation.price, 4.0);
        assert_eq!(result.observation.price_history, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_step_info_bookkeeping() {
        let mut env = BatteryEnvironment::new(config(3), series(&[5.0, 8.0, 7.0])).unwrap();
        env.reset();
        env.step(Action::Charge).unwrap();
        let result = env.step(Action::Discharge).unwrap();

        assert_eq!(result.info.price, 8.0);
        assert_eq!(result.info.energy_sold, 2.0);
        assert_eq!(result.info.revenue, 16.0);
        assert_eq!(result.info.cumulative_reward, 6.0);
        assert_eq!(env.state().cumulative_reward, 6.0);
    }

    #[test]
    fn test_truncated_when_series_shorter_than_max_steps() {
        let mut env = BatteryEnvironment::new(config(10), series(&[5.0, 5.0])).unwrap();
        env.reset();
        assert!(!env.step(Action::Hold).unwrap().done);

        let last = env.step(Action::Hold).unwrap();
        assert!(last.done);
        assert!(last.truncated);
        assert_eq!(last.observation.price, 5.0);
    }

    #[test]
    fn test_reset_at_offset() {
        let mut env =
            BatteryEnvironment::new(config(2), series(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        let obs = env.reset_at(2).unwrap();
        assert_eq!(obs.price, 3.0);
        assert_eq!(env.episode_length(), 2);

        assert!(matches!(env.reset_at(4), Err(ArbError::OutOfRange(_))));
    }

    #[test]
    fn test_raw_invalid_action_ends_episode() {
        let mut env = BatteryEnvironment::new(config(3), series(&[1.0, 2.0, 3.0])).unwrap();
        env.reset();

        let err = env.step_raw(9).unwrap_err();
        assert!(matches!(err, ArbError::InvalidAction(_)));
        assert!(env.is_done());
        assert!(matches!(env.step(Action::Hold), Err(ArbError::OutOfRange(_))));

        env.reset();
        assert!(env.step_raw(1).is_ok());
    }

    #[test]
    fn test_clone_has_independent_state() {
        let mut env = BatteryEnvironment::new(config(3), series(&[1.0, 2.0, 3.0])).unwrap();
        env.reset();
        let mut worker = env.clone();

        worker.step(Action::Charge).unwrap();
        assert_eq!(env.state().stored_energy, 0.0);
        assert_eq!(worker.state().stored_energy, 2.0);
        assert!(Arc::ptr_eq(env.prices(), worker.prices()));
    }

    #[test]
    fn test_environment_is_send() {
        fn assert_send<T: Send + Sync>() {}
        assert_send::<BatteryEnvironment>();
    }
}
