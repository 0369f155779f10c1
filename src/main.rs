use battery_arb::cli::{Cli, Commands, ConfigCommands};
use battery_arb::config::AppConfig;
use battery_arb::error::Result;
use clap::Parser;

mod main_commands;
mod main_runtime;

use main_commands::{data, evaluate, settings, train};
use main_runtime::{init_logging, init_logging_simple};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    match &cli.command {
        Commands::Generate {
            steps,
            seed,
            output,
        } => {
            init_logging_simple();
            data::run_generate(&config, *steps, *seed, output)?;
        }
        Commands::Simulate {
            agent,
            data,
            model,
            offset,
            trace,
            json,
        } => {
            init_logging(&config.logging);
            evaluate::run_simulate(
                &config,
                agent,
                data.as_deref(),
                model.as_deref(),
                *offset,
                trace.as_deref(),
                *json,
            )?;
        }
        Commands::Compare {
            data,
            model,
            offset,
            json,
        } => {
            init_logging(&config.logging);
            evaluate::run_compare(&config, data.as_deref(), model.as_deref(), *offset, *json)?;
        }
        Commands::Train {
            data,
            episodes,
            checkpoint_dir,
            resume,
        } => {
            init_logging(&config.logging);
            train::run_train(
                &config,
                data.as_deref(),
                *episodes,
                checkpoint_dir.as_deref(),
                resume.as_deref(),
            )?;
        }
        Commands::Config(ConfigCommands::Show) => {
            init_logging_simple();
            settings::run_show(&config)?;
        }
        Commands::Config(ConfigCommands::Validate) => {
            init_logging_simple();
            settings::run_validate(&config)?;
        }
    }

    Ok(())
}
