use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "battery-arb")]
#[command(version)]
#[command(about = "Battery energy-storage arbitrage simulator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml, $BATTERY_ARB_ENV.toml)
    #[arg(short, long, global = true, default_value = "config")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a synthetic hourly price series as CSV
    Generate {
        /// Number of price points
        #[arg(short, long)]
        steps: Option<usize>,
        /// Generator seed
        #[arg(long)]
        seed: Option<u64>,
        /// Output CSV path
        #[arg(short, long, default_value = "prices.csv")]
        output: PathBuf,
    },
    /// Run one evaluation episode with a single agent
    Simulate {
        /// Agent: hold, cost, moving-average, random, q-learning
        #[arg(short, long, default_value = "cost")]
        agent: String,
        /// Price data (CSV/JSON path or "synthetic"); defaults to environment.data_source
        #[arg(short, long)]
        data: Option<String>,
        /// Trained Q-table checkpoint (required for q-learning)
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Start the episode at this price index
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Write the per-step trace (.csv or .json)
        #[arg(short, long)]
        trace: Option<PathBuf>,
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// Evaluate all baseline agents (and a trained model) on the same episode
    Compare {
        /// Price data (CSV/JSON path or "synthetic")
        #[arg(short, long)]
        data: Option<String>,
        /// Trained Q-table checkpoint to include
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Start the episode at this price index
        #[arg(long, default_value = "0")]
        offset: usize,
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// Train the Q-learning agent
    Train {
        /// Price data (CSV/JSON path or "synthetic")
        #[arg(short, long)]
        data: Option<String>,
        /// Number of training episodes (overrides training.episodes)
        #[arg(short, long)]
        episodes: Option<usize>,
        /// Checkpoint directory (overrides training.checkpoint_dir)
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,
        /// Resume from a checkpoint file, or "latest"
        #[arg(long)]
        resume: Option<String>,
    },
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}
