//! Uniform random baseline

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::traits::Agent;
use crate::rl::core::{Action, Observation};

/// Picks uniformly among all actions. Seeded so evaluations are repeatable.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    seed: u64,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart the action stream from the original seed
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &'static str {
        "random"
    }

    fn act(&mut self, _observation: &Observation) -> Action {
        *Action::all()
            .choose(&mut self.rng)
            .unwrap_or(&Action::Hold)
    }
}
