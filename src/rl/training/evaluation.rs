//! Evaluation
//!
//! Runs single greedy episodes, records per-step traces for external
//! plotting and condenses them into comparable reports.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ArbError, Result};
use crate::rl::agents::Agent;
use crate::rl::core::{Action, Observation};
use crate::rl::environment::{BatteryEnvironment, StepResult};

/// One environment step as recorded in a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub action: Action,
    pub energy_bought: f64,
    pub energy_stored: f64,
    pub energy_sold: f64,
    pub cost: f64,
    pub revenue: f64,
    pub reward: f64,
    /// Stored energy after the step
    pub stored_energy: f64,
    pub cumulative_reward: f64,
}

impl StepRecord {
    fn from_result(step: usize, result: &StepResult) -> Self {
        let info = &result.info;
        Self {
            step,
            timestamp: info.timestamp,
            price: info.price,
            action: info.action,
            energy_bought: info.energy_bought,
            energy_stored: info.energy_stored,
            energy_sold: info.energy_sold,
            cost: info.cost,
            revenue: info.revenue,
            reward: result.reward,
            stored_energy: info.stored_energy,
            cumulative_reward: info.cumulative_reward,
        }
    }
}

/// Full record of one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeTrace {
    pub agent: String,
    pub start_offset: usize,
    pub initial_energy: f64,
    /// Episode ended because the price series ran out
    pub truncated: bool,
    pub records: Vec<StepRecord>,
}

const CSV_HEADER: &str = "step,timestamp,price,action,energy_bought,energy_stored,energy_sold,cost,revenue,reward,stored_energy,cumulative_reward";

impl EpisodeTrace {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_reward(&self) -> f64 {
        self.records.iter().map(|r| r.reward).sum()
    }

    pub fn final_energy(&self) -> f64 {
        self.records
            .last()
            .map(|r| r.stored_energy)
            .unwrap_or(self.initial_energy)
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::with_capacity(64 * (self.records.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');

        for r in &self.records {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                r.step,
                r.timestamp.to_rfc3339(),
                r.price,
                r.action,
                r.energy_bought,
                r.energy_stored,
                r.energy_sold,
                r.cost,
                r.revenue,
                r.reward,
                r.stored_energy,
                r.cumulative_reward
            );
        }
        out
    }

    /// Write the trace as CSV (one row per step)
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_csv_string())?;
        debug!("Wrote {} trace rows to {:?}", self.records.len(), path);
        Ok(())
    }

    /// Write the trace as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Wrote trace JSON to {:?}", path);
        Ok(())
    }

    /// Write as JSON when the extension is `.json`, CSV otherwise
    pub fn write(&self, path: &Path) -> Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => self.write_json(path),
            _ => self.write_csv(path),
        }
    }
}

/// Reset the environment once and step with `agent` until done
pub fn run_episode<A>(env: &mut BatteryEnvironment, agent: &mut A) -> Result<EpisodeTrace>
where
    A: Agent + ?Sized,
{
    let obs = env.reset();
    drive(env, agent, obs)
}

/// Like [`run_episode`] but starting at price index `offset`
pub fn run_episode_at<A>(
    env: &mut BatteryEnvironment,
    agent: &mut A,
    offset: usize,
) -> Result<EpisodeTrace>
where
    A: Agent + ?Sized,
{
    let obs = env.reset_at(offset)?;
    drive(env, agent, obs)
}

fn drive<A>(
    env: &mut BatteryEnvironment,
    agent: &mut A,
    mut obs: Observation,
) -> Result<EpisodeTrace>
where
    A: Agent + ?Sized,
{
    agent.begin_episode();

    let mut trace = EpisodeTrace {
        agent: agent.name().to_string(),
        start_offset: env.start_offset(),
        initial_energy: env.state().stored_energy,
        truncated: false,
        records: Vec::with_capacity(env.episode_length()),
    };

    loop {
        let action = agent.act(&obs);
        let result = env.step(action)?;
        trace
            .records
            .push(StepRecord::from_result(trace.records.len(), &result));

        if result.done {
            trace.truncated = result.truncated;
            break;
        }
        obs = result.observation;
    }

    debug!(
        "Episode for '{}' finished: steps={}, reward={:.2}",
        trace.agent,
        trace.len(),
        trace.total_reward()
    );

    Ok(trace)
}

/// Aggregate figures for one evaluated episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub agent: String,
    pub steps: usize,
    pub total_reward: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub energy_bought: f64,
    pub energy_sold: f64,
    pub charge_steps: usize,
    pub discharge_steps: usize,
    pub hold_steps: usize,
    /// Cost per unit of grid energy bought (0 when nothing was bought)
    pub avg_buy_price: f64,
    /// Revenue per unit of energy sold (0 when nothing was sold)
    pub avg_sell_price: f64,
    pub final_energy: f64,
    pub truncated: bool,
}

impl EvaluationReport {
    pub fn from_trace(trace: &EpisodeTrace) -> Self {
        let records = &trace.records;
        let count = |a: Action| records.iter().filter(|r| r.action == a).count();

        let total_cost: f64 = records.iter().map(|r| r.cost).sum();
        let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
        let energy_bought: f64 = records.iter().map(|r| r.energy_bought).sum();
        let energy_sold: f64 = records.iter().map(|r| r.energy_sold).sum();

        Self {
            agent: trace.agent.clone(),
            steps: trace.len(),
            total_reward: trace.total_reward(),
            total_cost,
            total_revenue,
            energy_bought,
            energy_sold,
            charge_steps: count(Action::Charge),
            discharge_steps: count(Action::Discharge),
            hold_steps: count(Action::Hold),
            avg_buy_price: ratio(total_cost, energy_bought),
            avg_sell_price: ratio(total_revenue, energy_sold),
            final_energy: trace.final_energy(),
            truncated: trace.truncated,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 1e-12 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Evaluate several agents over the same episode.
///
/// Each agent runs on its own clone of `env` in a scoped thread; clones share
/// the price series but never episode state. Reports keep the input order.
pub fn compare_agents(
    env: &BatteryEnvironment,
    agents: Vec<Box<dyn Agent>>,
) -> Result<Vec<EvaluationReport>> {
    let traces: Vec<Result<EpisodeTrace>> = std::thread::scope(|scope| {
        let handles: Vec<_> = agents
            .into_iter()
            .map(|mut agent| {
                let mut worker = env.clone();
                let offset = env.start_offset();
                scope.spawn(move || run_episode_at(&mut worker, &mut agent, offset))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(ArbError::Other(anyhow::anyhow!(
                        "evaluation worker panicked"
                    )))
                })
            })
            .collect()
    });

    let mut reports = Vec::with_capacity(traces.len());
    for trace in traces {
        let report = EvaluationReport::from_trace(&trace?);
        info!(
            "{}: reward={:.2}, bought={:.2}, sold={:.2}",
            report.agent, report.total_reward, report.energy_bought, report.energy_sold
        );
        reports.push(report);
    }

    Ok(reports)
}
