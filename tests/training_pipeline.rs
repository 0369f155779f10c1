use std::sync::Arc;

use battery_arb::domain::{PriceSeries, SyntheticPriceConfig};
use battery_arb::rl::agents::{create_agent, HoldAgent, QLearningAgent, TrainableAgent};
use battery_arb::rl::config::{EnvironmentConfig, HeuristicConfig, TrainingConfig};
use battery_arb::rl::training::{
    compare_agents, run_episode, summarize_results, train, Checkpointer, EvaluationReport,
};
use battery_arb::rl::BatteryEnvironment;

fn environment(steps: usize, max_steps: usize) -> BatteryEnvironment {
    let prices = PriceSeries::synthetic(&SyntheticPriceConfig {
        steps,
        seed: 11,
        ..Default::default()
    })
    .unwrap();
    let config = EnvironmentConfig {
        max_steps,
        ..Default::default()
    };
    BatteryEnvironment::new(config, Arc::new(prices)).unwrap()
}

fn training(dir: &std::path::Path, episodes: usize) -> TrainingConfig {
    TrainingConfig {
        episodes,
        exploration_decay: 0.9,
        replay_batch: 8,
        replay_capacity: 512,
        checkpoint_frequency: 4,
        checkpoint_dir: dir.to_string_lossy().into_owned(),
        max_checkpoints: 2,
        log_every: 5,
        ..Default::default()
    }
}

/// Training runs every episode, rotates checkpoints and leaves the agent greedy.
#[test]
fn train_writes_rotated_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let config = training(dir.path(), 10);
    let checkpointer = Checkpointer::new(dir.path(), config.max_checkpoints).unwrap();

    let mut env = environment(24 * 7, 48);
    let mut agent = QLearningAgent::new(&config).unwrap();
    let results = train(&mut env, &mut agent, &config, Some(&checkpointer)).unwrap();

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| r.length == 48));
    assert!(results.iter().all(|r| r.start_offset + 48 <= 24 * 7));
    // epsilon decays across episodes
    assert!(results[9].exploration_rate < results[0].exploration_rate);
    assert!(agent.states_visited() > 0);
    assert_eq!(agent.exploration_rate(), 0.0);

    // saved at 4, 8 and the final 10; only the newest two survive
    assert_eq!(
        checkpointer.list_checkpoints(),
        vec![
            "q-learning_ep000008".to_string(),
            "q-learning_ep000010".to_string()
        ]
    );

    let summary = summarize_results(&results);
    assert_eq!(summary.num_episodes, 10);
    assert!(summary.best_reward >= summary.worst_reward);
}

/// Same seeds produce the same training run.
#[test]
fn training_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let config = training(dir.path(), 6);

    let run = || {
        let mut env = environment(24 * 5, 24);
        let mut agent = QLearningAgent::new(&config).unwrap();
        train(&mut env, &mut agent, &config, None).unwrap()
    };

    assert_eq!(run(), run());
}

/// A saved model reloads through the agent factory and behaves identically.
#[test]
fn checkpoint_reloads_for_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let config = training(dir.path(), 8);
    let checkpointer = Checkpointer::new(dir.path(), 3).unwrap();

    let mut env = environment(24 * 4, 24);
    let mut agent = QLearningAgent::new(&config).unwrap();
    train(&mut env, &mut agent, &config, Some(&checkpointer)).unwrap();

    let path = checkpointer.latest_path().unwrap();
    let mut loaded = create_agent(
        "q-learning",
        &HeuristicConfig::default(),
        &config,
        Some(path.as_path()),
    )
    .unwrap();

    let original = run_episode(&mut env, &mut agent).unwrap();
    let restored = run_episode(&mut env, &mut loaded).unwrap();

    let actions = |t: &battery_arb::rl::EpisodeTrace| {
        t.records.iter().map(|r| r.action).collect::<Vec<_>>()
    };
    assert_eq!(actions(&original), actions(&restored));
    assert_eq!(original.total_reward(), restored.total_reward());
}

/// Resuming keeps the learned table and the episode count.
#[test]
fn resume_continues_from_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let config = training(dir.path(), 4);
    let checkpointer = Checkpointer::new(dir.path(), 5).unwrap();

    let mut env = environment(24 * 4, 24);
    let mut agent = QLearningAgent::new(&config).unwrap();
    train(&mut env, &mut agent, &config, Some(&checkpointer)).unwrap();

    let mut resumed =
        QLearningAgent::load(&checkpointer.latest_path().unwrap(), &config).unwrap();
    assert_eq!(resumed.episodes_trained(), 4);
    assert_eq!(resumed.states_visited(), agent.states_visited());

    train(&mut env, &mut resumed, &config, None).unwrap();
    assert_eq!(resumed.episodes_trained(), 8);
}

/// A resumed run keeps numbering checkpoints and its output becomes the latest.
#[test]
fn resumed_run_checkpoints_survive_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = training(dir.path(), 10);
    config.checkpoint_frequency = 5;
    let checkpointer = Checkpointer::new(dir.path(), 2).unwrap();

    let mut env = environment(24 * 4, 24);
    let mut agent = QLearningAgent::new(&config).unwrap();
    train(&mut env, &mut agent, &config, Some(&checkpointer)).unwrap();
    assert_eq!(
        checkpointer.latest_checkpoint().as_deref(),
        Some("q-learning_ep000010")
    );

    let mut resumed =
        QLearningAgent::load(&checkpointer.latest_path().unwrap(), &config).unwrap();
    resumed.set_training(true);
    config.episodes = 4;
    train(&mut env, &mut resumed, &config, Some(&checkpointer)).unwrap();
    assert_eq!(resumed.episodes_trained(), 14);

    assert_eq!(
        checkpointer.list_checkpoints(),
        vec![
            "q-learning_ep000010".to_string(),
            "q-learning_ep000014".to_string()
        ]
    );
    let latest = QLearningAgent::load(&checkpointer.latest_path().unwrap(), &config).unwrap();
    assert_eq!(latest.episodes_trained(), 14);
    assert_eq!(latest.states_visited(), resumed.states_visited());
}

/// Evaluation compares every baseline over one episode.
#[test]
fn compare_baselines_on_shared_episode() {
    let env = environment(24 * 3, 72);
    let heuristics = HeuristicConfig::default();
    let training = TrainingConfig::default();

    let agents = ["hold", "cost", "moving-average", "random"]
        .iter()
        .map(|name| create_agent(name, &heuristics, &training, None).unwrap())
        .collect();
    let reports = compare_agents(&env, agents).unwrap();

    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| r.steps == 72));

    let hold = &reports[0];
    assert_eq!(hold.agent, "hold");
    assert_eq!(hold.total_reward, 0.0);
    assert_eq!(hold.hold_steps, 72);

    let mut env = environment(24 * 3, 72);
    let direct = EvaluationReport::from_trace(&run_episode(&mut env, &mut HoldAgent).unwrap());
    assert_eq!(&direct, hold);
}
