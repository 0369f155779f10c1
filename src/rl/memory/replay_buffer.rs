//! Replay Buffer
//!
//! Experience replay buffer for off-policy learning.

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::rl::core::{Action, Observation};

/// A single transition in the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Observation the action was chosen from
    pub observation: Observation,
    pub action: Action,
    pub reward: f64,
    /// Observation after the step
    pub next_observation: Observation,
    /// Whether episode terminated
    pub done: bool,
}

impl Transition {
    pub fn new(
        observation: Observation,
        action: Action,
        reward: f64,
        next_observation: Observation,
        done: bool,
    ) -> Self {
        Self {
            observation,
            action,
            reward,
            next_observation,
            done,
        }
    }
}

/// Bounded FIFO store of transitions
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    /// Storage for transitions
    buffer: VecDeque<Transition>,
    /// Maximum capacity
    capacity: usize,
}

impl ReplayBuffer {
    /// Create a new replay buffer with given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a transition, evicting the oldest when full
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Sample up to `batch_size` distinct transitions.
    ///
    /// The caller supplies the RNG so seeded training stays reproducible.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<&Transition> {
        let amount = batch_size.min(self.buffer.len());
        sample(rng, self.buffer.len(), amount)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if buffer has enough samples for training
    pub fn has_enough_samples(&self, min_samples: usize) -> bool {
        self.buffer.len() >= min_samples
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.buffer.len() as f32 / self.capacity as f32
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(10_000)
    }
}
