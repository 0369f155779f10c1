//! Tabular Q-learning agent
//!
//! In-process learner for the dispatch problem. Observations are discretised
//! into a small state key (price relative to the recent mean, state of
//! charge, short-term trend); values are learned with TD(0) updates and
//! experience replay.

use std::collections::HashMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::traits::{Agent, TrainableAgent};
use crate::error::{ArbError, Result};
use crate::rl::config::TrainingConfig;
use crate::rl::core::{Action, Observation, NUM_ACTIONS};
use crate::rl::memory::{ReplayBuffer, Transition};

const CHECKPOINT_VERSION: u32 = 1;

/// Discrete state used to index the Q-table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    pub price_bin: u8,
    pub soc_bin: u8,
    /// -1 falling, 0 flat, 1 rising
    pub trend: i8,
}

/// Maps continuous observations onto `StateKey`s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    pub price_bins: usize,
    pub soc_bins: usize,
    /// Relative deviation from the mean covered by the price bins (±)
    pub price_spread: f64,
    /// Relative move below which the trend counts as flat
    pub trend_tolerance: f64,
}

impl Discretizer {
    pub fn new(price_bins: usize, soc_bins: usize) -> Self {
        Self {
            price_bins: price_bins.clamp(2, u8::MAX as usize),
            soc_bins: soc_bins.clamp(2, u8::MAX as usize),
            price_spread: 0.3,
            trend_tolerance: 0.01,
        }
    }

    /// Reject bin layouts that `key` cannot index
    pub fn validate(&self) -> std::result::Result<(), String> {
        let bins = 2..=u8::MAX as usize;
        if !bins.contains(&self.price_bins) || !bins.contains(&self.soc_bins) {
            return Err(format!(
                "bins must be in [2, {}], got price_bins={} soc_bins={}",
                u8::MAX,
                self.price_bins,
                self.soc_bins
            ));
        }
        if !(self.price_spread.is_finite() && self.price_spread > 0.0) {
            return Err(format!("price_spread must be positive, got {}", self.price_spread));
        }
        if !(self.trend_tolerance.is_finite() && self.trend_tolerance >= 0.0) {
            return Err(format!(
                "trend_tolerance must be non-negative, got {}",
                self.trend_tolerance
            ));
        }
        Ok(())
    }

    pub fn key(&self, obs: &Observation) -> StateKey {
        let mean = obs.history_mean();
        let scale = mean.abs().max(1e-9);
        let relative = (obs.price - mean) / scale;

        let normalized = ((relative + self.price_spread) / (2.0 * self.price_spread))
            .clamp(0.0, 1.0 - 1e-9);
        let price_bin = (normalized * self.price_bins as f64).floor() as u8;

        let soc_bin =
            (obs.state_of_charge.clamp(0.0, 1.0) * (self.soc_bins - 1) as f64).round() as u8;

        let trend = match obs.momentum(1) {
            Some(delta) if delta / scale > self.trend_tolerance => 1,
            Some(delta) if delta / scale < -self.trend_tolerance => -1,
            _ => 0,
        };

        StateKey {
            price_bin,
            soc_bin,
            trend,
        }
    }
}

/// Learning hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QLearningParams {
    pub learning_rate: f64,
    pub discount: f64,
    pub exploration_rate: f64,
    pub exploration_decay: f64,
    pub exploration_min: f64,
    pub replay_batch: usize,
}

impl From<&TrainingConfig> for QLearningParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            discount: config.discount,
            exploration_rate: config.exploration_rate,
            exploration_decay: config.exploration_decay,
            exploration_min: config.exploration_min,
            replay_batch: config.replay_batch,
        }
    }
}

type QTable = HashMap<StateKey, [f64; NUM_ACTIONS]>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QEntry {
    state: StateKey,
    q_values: [f64; NUM_ACTIONS],
}

/// On-disk format of a trained agent
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QCheckpoint {
    version: u32,
    agent: String,
    episodes_trained: usize,
    params: QLearningParams,
    discretizer: Discretizer,
    entries: Vec<QEntry>,
}

/// Epsilon-greedy tabular Q-learning agent
pub struct QLearningAgent {
    params: QLearningParams,
    discretizer: Discretizer,
    table: QTable,
    replay: ReplayBuffer,
    rng: StdRng,
    training: bool,
    episodes_trained: usize,
}

impl QLearningAgent {
    /// Create an untrained agent
    pub fn new(config: &TrainingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            params: QLearningParams::from(config),
            discretizer: Discretizer::new(config.price_bins, config.soc_bins),
            table: HashMap::new(),
            replay: ReplayBuffer::new(config.replay_capacity),
            rng: StdRng::seed_from_u64(config.seed),
            training: true,
            episodes_trained: 0,
        })
    }

    /// Restore a saved agent. Loaded agents start in evaluation mode.
    pub fn load(path: &Path, config: &TrainingConfig) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArbError::Checkpoint(format!("cannot read {}: {}", path.display(), e))
        })?;
        let checkpoint: QCheckpoint = serde_json::from_str(&content)?;

        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(ArbError::Checkpoint(format!(
                "unsupported checkpoint version {} in {}",
                checkpoint.version,
                path.display()
            )));
        }

        checkpoint.discretizer.validate().map_err(|reason| {
            ArbError::Checkpoint(format!("invalid discretizer in {}: {}", path.display(), reason))
        })?;

        let table = checkpoint
            .entries
            .into_iter()
            .map(|e| (e.state, e.q_values))
            .collect::<QTable>();

        info!(
            "Loaded Q-table from {:?}: {} states, {} episodes trained",
            path,
            table.len(),
            checkpoint.episodes_trained
        );

        Ok(Self {
            params: checkpoint.params,
            discretizer: checkpoint.discretizer,
            table,
            replay: ReplayBuffer::new(config.replay_capacity),
            rng: StdRng::seed_from_u64(config.seed),
            training: false,
            episodes_trained: checkpoint.episodes_trained,
        })
    }

    /// Q-values for an observation (zeros for unseen states)
    pub fn q_values(&self, obs: &Observation) -> [f64; NUM_ACTIONS] {
        self.table
            .get(&self.discretizer.key(obs))
            .copied()
            .unwrap_or([0.0; NUM_ACTIONS])
    }

    /// Highest-valued action; ties resolve to the lowest index (HOLD first)
    pub fn greedy_action(&self, obs: &Observation) -> Action {
        best_index(&self.q_values(obs))
            .and_then(|i| Action::from_index(i).ok())
            .unwrap_or_default()
    }

    pub fn states_visited(&self) -> usize {
        self.table.len()
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl Agent for QLearningAgent {
    fn name(&self) -> &'static str {
        "q-learning"
    }

    fn act(&mut self, obs: &Observation) -> Action {
        if self.training && self.rng.gen::<f64>() < self.params.exploration_rate {
            let index = self.rng.gen_range(0..NUM_ACTIONS);
            return Action::from_index(index).unwrap_or_default();
        }
        self.greedy_action(obs)
    }
}

impl TrainableAgent for QLearningAgent {
    fn update(&mut self, transition: &Transition) {
        if !self.training {
            return;
        }

        td_update(&mut self.table, &self.discretizer, &self.params, transition);
        self.replay.push(transition.clone());

        if self.params.replay_batch > 0 && self.replay.has_enough_samples(self.params.replay_batch)
        {
            let batch = self.replay.sample(self.params.replay_batch, &mut self.rng);
            for replayed in batch {
                td_update(&mut self.table, &self.discretizer, &self.params, replayed);
            }
        }
    }

    fn end_episode(&mut self) {
        if !self.training {
            return;
        }
        self.episodes_trained += 1;
        self.params.exploration_rate = (self.params.exploration_rate
            * self.params.exploration_decay)
            .max(self.params.exploration_min);
    }

    fn exploration_rate(&self) -> f64 {
        if self.training {
            self.params.exploration_rate
        } else {
            0.0
        }
    }

    fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn save(&self, path: &Path) -> Result<()> {
        let mut entries: Vec<QEntry> = self
            .table
            .iter()
            .map(|(state, q_values)| QEntry {
                state: *state,
                q_values: *q_values,
            })
            .collect();
        entries.sort_by_key(|e| e.state);

        let checkpoint = QCheckpoint {
            version: CHECKPOINT_VERSION,
            agent: self.name().to_string(),
            episodes_trained: self.episodes_trained,
            params: self.params.clone(),
            discretizer: self.discretizer.clone(),
            entries,
        };

        std::fs::write(path, serde_json::to_string_pretty(&checkpoint)?)?;
        debug!("Wrote Q-table with {} states to {:?}", self.table.len(), path);
        Ok(())
    }
}

fn best_index(values: &[f64; NUM_ACTIONS]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

fn td_update(
    table: &mut QTable,
    discretizer: &Discretizer,
    params: &QLearningParams,
    transition: &Transition,
) {
    let next_key = discretizer.key(&transition.next_observation);
    let next_best = if transition.done {
        0.0
    } else {
        table
            .get(&next_key)
            .map(|q| q.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .unwrap_or(0.0)
    };

    let key = discretizer.key(&transition.observation);
    let entry = table.entry(key).or_insert([0.0; NUM_ACTIONS]);
    let slot = &mut entry[transition.action.to_index()];

    let target = transition.reward + params.discount * next_best;
    *slot += params.learning_rate * (target - *slot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn obs(price: f64, soc: f64, history: Vec<f64>) -> Observation {
        Observation {
            step_index: 0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            price,
            stored_energy: soc * 10.0,
            state_of_charge: soc,
            cost_basis: 0.0,
            price_history: history,
        }
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            replay_batch: 0,
            exploration_rate: 0.0,
            exploration_min: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_discretizer_bins() {
        let d = Discretizer::new(4, 5);

        let low = d.key(&obs(35.0, 0.0, vec![50.0, 50.0, 35.0]));
        let high = d.key(&obs(70.0, 1.0, vec![50.0, 50.0, 70.0]));

        assert!(low.price_bin < high.price_bin);
        assert_eq!(low.soc_bin, 0);
        assert_eq!(high.soc_bin, 4);
        assert_eq!(low.trend, -1);
        assert_eq!(high.trend, 1);
        assert!((high.price_bin as usize) < 4);
    }

    #[test]
    fn test_unseen_state_is_hold() {
        let agent = QLearningAgent::new(&config()).unwrap();
        assert_eq!(agent.greedy_action(&obs(50.0, 0.5, vec![50.0])), Action::Hold);
    }

    #[test]
    fn test_td_update_moves_toward_reward() {
        let mut agent = QLearningAgent::new(&config()).unwrap();
        let state = obs(40.0, 0.0, vec![50.0, 40.0]);
        let next = obs(60.0, 0.2, vec![40.0, 60.0]);

        for _ in 0..50 {
            agent.update(&Transition::new(
                state.clone(),
                Action::Charge,
                5.0,
                next.clone(),
                true,
            ));
        }

        let q = agent.q_values(&state);
        assert!((q[Action::Charge.to_index()] - 5.0).abs() < 0.1);
        assert_eq!(agent.greedy_action(&state), Action::Charge);
    }

    #[test]
    fn test_no_learning_when_not_training() {
        let mut agent = QLearningAgent::new(&config()).unwrap();
        agent.set_training(false);
        let state = obs(40.0, 0.0, vec![40.0]);
        agent.update(&Transition::new(
            state.clone(),
            Action::Charge,
            5.0,
            state.clone(),
            true,
        ));
        assert_eq!(agent.states_visited(), 0);
    }

    #[test]
    fn test_exploration_decay_floor() {
        let mut agent = QLearningAgent::new(&TrainingConfig {
            exploration_rate: 1.0,
            exploration_decay: 0.5,
            exploration_min: 0.2,
            ..Default::default()
        })
        .unwrap();

        for _ in 0..5 {
            agent.end_episode();
        }
        assert_eq!(agent.exploration_rate(), 0.2);
        assert_eq!(agent.episodes_trained(), 5);
    }

    #[test]
    fn test_best_index_ties_prefer_first() {
        assert_eq!(best_index(&[0.0, 0.0, 0.0]), Some(0));
        assert_eq!(best_index(&[0.0, 2.0, 2.0]), Some(1));
        assert_eq!(best_index(&[-1.0, -3.0, 4.0]), Some(2));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");

        let mut agent = QLearningAgent::new(&config()).unwrap();
        let state = obs(40.0, 0.0, vec![50.0, 40.0]);
        agent.update(&Transition::new(
            state.clone(),
            Action::Charge,
            3.0,
            state.clone(),
            true,
        ));
        agent.end_episode();
        agent.save(&path).unwrap();

        let loaded = QLearningAgent::load(&path, &config()).unwrap();
        assert!(!loaded.is_training());
        assert_eq!(loaded.episodes_trained(), 1);
        let restored = loaded.q_values(&state);
        let original = agent.q_values(&state);
        for (a, b) in restored.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(loaded.greedy_action(&state), Action::Charge);
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");
        let agent = QLearningAgent::new(&config()).unwrap();
        agent.save(&path).unwrap();

        let content = std::fs::read_to_string(&path)
            .unwrap()
            .replace("\"version\": 1", "\"version\": 99");
        std::fs::write(&path, content).unwrap();

        assert!(matches!(
            QLearningAgent::load(&path, &config()),
            Err(ArbError::Checkpoint(_))
        ));
    }

    #[test]
    fn test_load_rejects_degenerate_bins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");
        let agent = QLearningAgent::new(&config()).unwrap();
        agent.save(&path).unwrap();

        let mut checkpoint: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        checkpoint["discretizer"]["soc_bins"] = serde_json::json!(0);
        std::fs::write(&path, checkpoint.to_string()).unwrap();

        assert!(matches!(
            QLearningAgent::load(&path, &config()),
            Err(ArbError::Checkpoint(_))
        ));
        assert!(Discretizer::new(0, 0).validate().is_ok());
    }
}
