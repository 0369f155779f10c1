//! Agent traits: the capability the environment is driven by
//!
//! The environment never depends on how a decision is made. Rule-based
//! agents only implement `Agent`; learners additionally implement
//! `TrainableAgent` so the training loop can feed transitions back.

use std::path::Path;

use crate::error::Result;
use crate::rl::core::{Action, Observation};
use crate::rl::memory::Transition;

/// Produces an action for every observation
#[cfg_attr(test, mockall::automock)]
pub trait Agent: Send {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Called once after each environment reset
    fn begin_episode(&mut self) {}

    /// Choose the next action
    fn act(&mut self, observation: &Observation) -> Action;
}

/// Agent that learns from experience
pub trait TrainableAgent: Agent {
    /// Learn from one environment transition
    fn update(&mut self, transition: &Transition);

    /// Called once when an episode finishes (e.g. to decay exploration)
    fn end_episode(&mut self) {}

    /// Current exploration rate
    fn exploration_rate(&self) -> f64 {
        0.0
    }

    /// Episodes learned so far, including those restored from a checkpoint
    fn episodes_trained(&self) -> usize {
        0
    }

    /// Toggle exploration/learning; evaluation runs with training off
    fn set_training(&mut self, training: bool);

    /// Persist learned parameters
    fn save(&self, path: &Path) -> Result<()>;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn begin_episode(&mut self) {
        (**self).begin_episode()
    }

    fn act(&mut self, observation: &Observation) -> Action {
        (**self).act(observation)
    }
}
