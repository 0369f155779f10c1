//! Agents
//!
//! Decision makers that drive the battery environment: rule-based baselines,
//! a seeded random baseline and a tabular Q-learning agent.

mod heuristic;
mod q_learning;
mod random;
mod traits;

use std::path::Path;

pub use heuristic::{HoldAgent, MovingAverageAgent, PriceVsCostAgent};
pub use q_learning::{Discretizer, QLearningAgent, QLearningParams, StateKey};
pub use random::RandomAgent;
pub use traits::{Agent, TrainableAgent};

#[cfg(test)]
pub use traits::MockAgent;

use crate::error::{ArbError, Result};
use crate::rl::config::{HeuristicConfig, TrainingConfig};

/// Names accepted by [`create_agent`]
pub const AGENT_NAMES: [&str; 5] = ["hold", "cost", "moving-average", "random", "q-learning"];

/// Build an agent by name.
///
/// `q-learning` requires a checkpoint; the loaded agent runs greedily.
pub fn create_agent(
    name: &str,
    heuristics: &HeuristicConfig,
    training: &TrainingConfig,
    checkpoint: Option<&Path>,
) -> Result<Box<dyn Agent>> {
    match name.trim().to_lowercase().as_str() {
        "hold" => Ok(Box::new(HoldAgent)),
        "cost" | "price-vs-cost" => Ok(Box::new(PriceVsCostAgent::from_config(heuristics))),
        "moving-average" | "ma" => Ok(Box::new(MovingAverageAgent::from_config(heuristics))),
        "random" => Ok(Box::new(RandomAgent::new(heuristics.random_seed))),
        "q-learning" | "q" => {
            let path = checkpoint.ok_or_else(|| {
                ArbError::Configuration(
                    "q-learning agent requires a trained model (--model)".to_string(),
                )
            })?;
            Ok(Box::new(QLearningAgent::load(path, training)?))
        }
        other => Err(ArbError::Configuration(format!(
            "unknown agent '{}', expected one of: {}",
            other,
            AGENT_NAMES.join(", ")
        ))),
    }
}
