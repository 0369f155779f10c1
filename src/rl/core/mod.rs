//! Core RL abstractions
//!
//! Fundamental types for actions, state/observations, and settlement.

pub mod action;
pub mod reward;
pub mod state;

pub use action::{Action, NUM_ACTIONS};
pub use reward::{settle, updated_cost_basis, Settlement};
pub use state::{EnvironmentState, EpisodePhase, Observation};
