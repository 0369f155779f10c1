use std::path::Path;

use battery_arb::config::AppConfig;
use battery_arb::error::Result;
use battery_arb::output::{print_reports, OutputMode};
use battery_arb::rl::agents::{create_agent, Agent};
use battery_arb::rl::environment::BatteryEnvironment;
use battery_arb::rl::training::{compare_agents, run_episode_at, EvaluationReport};
use tracing::info;

const BASELINES: [&str; 4] = ["hold", "cost", "moving-average", "random"];

fn build_environment(config: &AppConfig, data: Option<&str>) -> Result<BatteryEnvironment> {
    let prices = config.load_prices(data)?;
    BatteryEnvironment::new(config.environment.clone(), prices)
}

/// One episode with a single agent
pub(crate) fn run_simulate(
    config: &AppConfig,
    agent: &str,
    data: Option<&str>,
    model: Option<&Path>,
    offset: usize,
    trace_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut env = build_environment(config, data)?;
    let mut agent = create_agent(agent, &config.heuristics, &config.training, model)?;

    info!(
        "Simulating '{}' on '{}' from offset {}",
        agent.name(),
        env.prices().source(),
        offset
    );

    let trace = run_episode_at(&mut env, &mut agent, offset)?;

    if let Some(path) = trace_path {
        trace.write(path)?;
        info!("Trace written to {}", path.display());
    }

    print_reports(
        &[EvaluationReport::from_trace(&trace)],
        OutputMode::from_json_flag(json),
    )
}

/// Every baseline (plus a trained model) over the same episode
pub(crate) fn run_compare(
    config: &AppConfig,
    data: Option<&str>,
    model: Option<&Path>,
    offset: usize,
    json: bool,
) -> Result<()> {
    let mut env = build_environment(config, data)?;
    env.reset_at(offset)?;

    let mut agents: Vec<Box<dyn Agent>> = BASELINES
        .iter()
        .map(|name| create_agent(name, &config.heuristics, &config.training, None))
        .collect::<Result<_>>()?;
    if let Some(path) = model {
        agents.push(create_agent(
            "q-learning",
            &config.heuristics,
            &config.training,
            Some(path),
        )?);
    }

    let reports = compare_agents(&env, agents)?;
    print_reports(&reports, OutputMode::from_json_flag(json))
}
