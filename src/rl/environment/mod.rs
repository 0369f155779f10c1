//! Battery Environment for RL Training
//!
//! Gym-like environment for training and evaluating dispatch agents on
//! historical or synthetic price data.

mod battery;

pub use battery::{BatteryEnvironment, StepInfo, StepResult};
