//! Battery Arbitrage Environment
//!
//! Gym-style simulation of a single grid battery trading against an hourly
//! price series, plus the agents and training loop that drive it.
//!
//! # Features
//!
//! - **Environment**: deterministic `reset`/`step` over CHARGE/DISCHARGE/HOLD
//! - **Rewards**: revenue minus cost per step, energy bounded by capacity
//! - **Agents**: rule-based baselines, seeded random, tabular Q-learning
//! - **Training**: episode loop with replay, JSON checkpoints, evaluation traces

pub mod agents;
pub mod config;
pub mod core;
pub mod environment;
pub mod memory;
pub mod training;

// Config exports
pub use config::{
    BatteryConfig, EnvironmentConfig, HeuristicConfig, SettlementPolicy, TrainingConfig,
    SYNTHETIC_SOURCE,
};

// Core exports
pub use core::{Action, EnvironmentState, EpisodePhase, Observation, Settlement, NUM_ACTIONS};

// Agent exports
pub use agents::{create_agent, Agent, QLearningAgent, TrainableAgent, AGENT_NAMES};

// Memory exports
pub use memory::{ReplayBuffer, Transition};

// Environment exports
pub use environment::{BatteryEnvironment, StepInfo, StepResult};

// Training exports
pub use training::{
    compare_agents, run_episode, summarize_results, train, Checkpointer, EpisodeResult,
    EpisodeTrace, EvaluationReport, TrainingSummary,
};
