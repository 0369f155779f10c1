//! Output formatting for command results.
//!
//! Supports two modes: human-readable tables (default) and JSON (--json).

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::error::Result;
use crate::rl::training::{EvaluationReport, TrainingSummary};

/// Output mode for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

/// Render a slice of Tabled + Serialize items in the chosen mode.
pub fn render_items<T: Tabled + Serialize>(items: &[T], mode: OutputMode) -> Result<String> {
    match mode {
        OutputMode::Table => {
            if items.is_empty() {
                Ok("(no results)".to_string())
            } else {
                Ok(Table::new(items).to_string())
            }
        }
        OutputMode::Json => Ok(serde_json::to_string_pretty(items)?),
    }
}

/// Print a slice of Tabled + Serialize items in the chosen mode.
pub fn print_items<T: Tabled + Serialize>(items: &[T], mode: OutputMode) -> Result<()> {
    println!("{}", render_items(items, mode)?);
    Ok(())
}

/// Print a single Serialize item as pretty JSON.
pub fn print_item<T: Serialize>(item: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(item)?);
    Ok(())
}

/// Table row for an evaluated episode
#[derive(Debug, Serialize, Tabled)]
pub struct ReportRow {
    pub agent: String,
    pub steps: usize,
    pub reward: String,
    pub cost: String,
    pub revenue: String,
    pub bought: String,
    pub sold: String,
    #[tabled(rename = "C/D/H")]
    pub actions: String,
    pub avg_buy: String,
    pub avg_sell: String,
    pub final_energy: String,
}

impl From<&EvaluationReport> for ReportRow {
    fn from(r: &EvaluationReport) -> Self {
        Self {
            agent: if r.truncated {
                format!("{} (truncated)", r.agent)
            } else {
                r.agent.clone()
            },
            steps: r.steps,
            reward: format!("{:.2}", r.total_reward),
            cost: format!("{:.2}", r.total_cost),
            revenue: format!("{:.2}", r.total_revenue),
            bought: format!("{:.3}", r.energy_bought),
            sold: format!("{:.3}", r.energy_sold),
            actions: format!(
                "{}/{}/{}",
                r.charge_steps, r.discharge_steps, r.hold_steps
            ),
            avg_buy: format!("{:.2}", r.avg_buy_price),
            avg_sell: format!("{:.2}", r.avg_sell_price),
            final_energy: format!("{:.3}", r.final_energy),
        }
    }
}

/// Print evaluation reports as a table, or the raw reports as JSON
pub fn print_reports(reports: &[EvaluationReport], mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Table => {
            let rows: Vec<ReportRow> = reports.iter().map(ReportRow::from).collect();
            print_items(&rows, mode)
        }
        OutputMode::Json => print_item(&reports),
    }
}

/// Print a boxed training summary
pub fn print_training_summary(summary: &TrainingSummary) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║               Training Summary                               ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!(
        "║  Episodes:          {:>10}                                 ║",
        summary.num_episodes
    );
    println!(
        "║  Avg Reward:        {:>10.2}                                 ║",
        summary.avg_reward
    );
    println!(
        "║  Best Reward:       {:>10.2}                                 ║",
        summary.best_reward
    );
    println!(
        "║  Worst Reward:      {:>10.2}                                 ║",
        summary.worst_reward
    );
    println!(
        "║  Recent Avg Reward: {:>10.2}                                 ║",
        summary.recent_avg_reward
    );
    println!(
        "║  Avg Length:        {:>10.1}                                 ║",
        summary.avg_episode_length
    );
    println!(
        "║  Avg Energy Sold:   {:>10.3}                                 ║",
        summary.avg_energy_sold
    );
    println!(
        "║  Final Epsilon:     {:>10.4}                                 ║",
        summary.final_exploration_rate
    );
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}
