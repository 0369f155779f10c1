//! Training Loop
//!
//! Runs episodes of the battery environment against a learning agent,
//! feeding every transition back and checkpointing along the way.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::checkpointing::{episode_name, Checkpointer};
use crate::error::Result;
use crate::rl::agents::TrainableAgent;
use crate::rl::config::TrainingConfig;
use crate::rl::environment::BatteryEnvironment;
use crate::rl::memory::Transition;

/// Episode result from training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    /// Episode number (1-based)
    pub episode: usize,
    /// Price index the episode started at
    pub start_offset: usize,
    /// Total reward for episode
    pub total_reward: f64,
    /// Episode length in steps
    pub length: usize,
    /// Grid energy bought during the episode
    pub energy_bought: f64,
    /// Stored energy sold during the episode
    pub energy_sold: f64,
    /// Stored energy when the episode ended
    pub final_energy: f64,
    /// Exploration rate the episode ran with
    pub exploration_rate: f64,
}

/// Train an agent for `config.episodes` episodes.
///
/// When the price series is longer than one episode each episode starts at
/// a random (seeded) offset so the agent sees the whole dataset.
///
/// Checkpoints are numbered by the agent's cumulative episode count, so a
/// resumed agent keeps counting from where its checkpoint left off.
pub fn train<A>(
    env: &mut BatteryEnvironment,
    agent: &mut A,
    config: &TrainingConfig,
    checkpointer: Option<&Checkpointer>,
) -> Result<Vec<EpisodeResult>>
where
    A: TrainableAgent + ?Sized,
{
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let max_offset = env
        .prices()
        .len()
        .saturating_sub(env.config().max_steps);
    let mut results = Vec::with_capacity(config.episodes);
    let mut last_saved = None;
    let first_episode = agent.episodes_trained();

    info!(
        "Training '{}' for {} episodes ({} already trained) on '{}' ({} prices)",
        agent.name(),
        config.episodes,
        first_episode,
        env.prices().source(),
        env.prices().len()
    );

    agent.set_training(true);

    for episode in 1..=config.episodes {
        let offset = if max_offset > 0 {
            rng.gen_range(0..=max_offset)
        } else {
            0
        };
        let exploration_rate = agent.exploration_rate();

        let mut obs = env.reset_at(offset)?;
        agent.begin_episode();

        let mut total_reward = 0.0;
        let mut energy_bought = 0.0;
        let mut energy_sold = 0.0;

        loop {
            let action = agent.act(&obs);
            let result = env.step(action)?;

            total_reward += result.reward;
            energy_bought += result.info.energy_bought;
            energy_sold += result.info.energy_sold;

            let transition = Transition::new(
                obs,
                action,
                result.reward,
                result.observation.clone(),
                result.done,
            );
            agent.update(&transition);

            obs = result.observation;
            if result.done {
                break;
            }
        }

        agent.end_episode();

        let episode_result = EpisodeResult {
            episode,
            start_offset: offset,
            total_reward,
            length: env.state().step_index,
            energy_bought,
            energy_sold,
            final_energy: env.state().stored_energy,
            exploration_rate,
        };

        debug!(
            "Episode {}: offset={}, reward={:.2}, steps={}",
            episode, offset, total_reward, episode_result.length
        );

        results.push(episode_result);

        if config.log_every > 0 && episode % config.log_every == 0 {
            let window = &results[results.len().saturating_sub(config.log_every)..];
            let avg = window.iter().map(|r| r.total_reward).sum::<f64>() / window.len() as f64;
            info!(
                "Episode {}/{}: reward={:.2}, avg_reward={:.2}, eps={:.3}",
                episode, config.episodes, total_reward, avg, exploration_rate
            );
        }

        if let Some(checkpointer) = checkpointer {
            if config.checkpoint_frequency > 0 && episode % config.checkpoint_frequency == 0 {
                let name = episode_name(agent.name(), first_episode + episode);
                checkpointer.save_with(&name, |path| agent.save(path))?;
                last_saved = Some(episode);
            }
        }
    }

    if let Some(checkpointer) = checkpointer {
        if config.episodes > 0 && last_saved != Some(config.episodes) {
            let name = episode_name(agent.name(), first_episode + config.episodes);
            checkpointer.save_with(&name, |path| agent.save(path))?;
        }
    }

    agent.set_training(false);

    let summary = summarize_results(&results);
    info!(
        "Training complete: episodes={}, avg_reward={:.2}, best={:.2}, recent_avg={:.2}",
        summary.num_episodes, summary.avg_reward, summary.best_reward, summary.recent_avg_reward
    );

    Ok(results)
}

/// Calculate training summary statistics
pub fn summarize_results(results: &[EpisodeResult]) -> TrainingSummary {
    if results.is_empty() {
        return TrainingSummary::default();
    }

    let n = results.len() as f64;
    let rewards = results.iter().map(|r| r.total_reward);

    let avg_reward = rewards.clone().sum::<f64>() / n;
    let best_reward = rewards.clone().fold(f64::NEG_INFINITY, f64::max);
    let worst_reward = rewards.fold(f64::INFINITY, f64::min);
    let avg_length = results.iter().map(|r| r.length as f64).sum::<f64>() / n;
    let avg_energy_sold = results.iter().map(|r| r.energy_sold).sum::<f64>() / n;

    // Last 10% of episodes, at least one
    let recent = (results.len() / 10).max(1);
    let recent_avg_reward = results[results.len() - recent..]
        .iter()
        .map(|r| r.total_reward)
        .sum::<f64>()
        / recent as f64;

    TrainingSummary {
        num_episodes: results.len(),
        avg_reward,
        best_reward,
        worst_reward,
        recent_avg_reward,
        avg_episode_length: avg_length,
        avg_energy_sold,
        final_exploration_rate: results[results.len() - 1].exploration_rate,
    }
}

/// Training summary statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Number of episodes
    pub num_episodes: usize,
    /// Average reward per episode
    pub avg_reward: f64,
    pub best_reward: f64,
    pub worst_reward: f64,
    /// Average reward over the last 10% of episodes
    pub recent_avg_reward: f64,
    /// Average episode length
    pub avg_episode_length: f64,
    /// Average energy sold per episode
    pub avg_energy_sold: f64,
    /// Exploration rate of the last episode
    pub final_exploration_rate: f64,
}
