//! Training Infrastructure
//!
//! Training loops, checkpointing, and evaluation utilities.

pub mod checkpointing;
pub mod evaluation;
pub mod trainer;

pub use checkpointing::{episode_name, parse_episode, Checkpointer};
pub use evaluation::{
    compare_agents, run_episode, run_episode_at, EpisodeTrace, EvaluationReport, StepRecord,
};
pub use trainer::{summarize_results, train, EpisodeResult, TrainingSummary};
