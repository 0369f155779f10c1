use std::path::Path;

use battery_arb::config::AppConfig;
use battery_arb::error::{ArbError, Result};
use battery_arb::output::{print_reports, print_training_summary, OutputMode};
use battery_arb::rl::agents::{QLearningAgent, TrainableAgent};
use battery_arb::rl::config::TrainingConfig;
use battery_arb::rl::environment::BatteryEnvironment;
use battery_arb::rl::training::{
    run_episode, summarize_results, train, Checkpointer, EvaluationReport,
};
use tracing::info;

/// Train the Q-learning agent and evaluate it greedily afterwards
pub(crate) fn run_train(
    config: &AppConfig,
    data: Option<&str>,
    episodes: Option<usize>,
    checkpoint_dir: Option<&Path>,
    resume: Option<&str>,
) -> Result<()> {
    let mut training = config.training.clone();
    if let Some(episodes) = episodes {
        training.episodes = episodes;
    }
    if let Some(dir) = checkpoint_dir {
        training.checkpoint_dir = dir.to_string_lossy().into_owned();
    }
    training.validate()?;

    let prices = config.load_prices(data)?;
    let mut env = BatteryEnvironment::new(config.environment.clone(), prices)?;
    let checkpointer = Checkpointer::new(&training.checkpoint_dir, training.max_checkpoints)?;

    let mut agent = match resume {
        Some("latest") => {
            let path = checkpointer.latest_path().ok_or_else(|| {
                ArbError::Checkpoint(format!(
                    "no checkpoint to resume in {}",
                    checkpointer.dir().display()
                ))
            })?;
            resume_from(&path, &training)?
        }
        Some(path) => resume_from(Path::new(path), &training)?,
        None => QLearningAgent::new(&training)?,
    };

    let results = train(&mut env, &mut agent, &training, Some(&checkpointer))?;
    print_training_summary(&summarize_results(&results));

    if let Some(path) = checkpointer.latest_path() {
        println!("Latest checkpoint: {}", path.display());
    }

    agent.set_training(false);
    let trace = run_episode(&mut env, &mut agent)?;
    print_reports(&[EvaluationReport::from_trace(&trace)], OutputMode::Table)
}

fn resume_from(path: &Path, training: &TrainingConfig) -> Result<QLearningAgent> {
    info!("Resuming from {}", path.display());
    let mut agent = QLearningAgent::load(path, training)?;
    agent.set_training(true);
    Ok(agent)
}
