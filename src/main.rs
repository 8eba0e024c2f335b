mod commands;
mod domain;
mod services;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::all_cmd::all_command;
use crate::commands::base_commands::{CliArgs, Commands};
use crate::commands::completions_cmd::completions_command;
use crate::commands::developers_cmd::developers_command;
use crate::commands::overview_cmd::overview_command;
use crate::commands::planning_cmd::planning_command;
use crate::commands::reports_cmd::reports_command;
use crate::commands::starvation_cmd::starvation_command;
use crate::commands::throughput_cmd::throughput_command;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let result = match args.command {
        Commands::Overview { config, output } => overview_command(&config, &output).await,
        Commands::Throughput { config, output } => throughput_command(&config, &output).await,
        Commands::Starvation {
            config,
            output,
            filter,
        } => starvation_command(&config, &output, filter).await,
        Commands::Developers {
            config,
            output,
            developer,
        } => developers_command(&config, &output, developer.as_deref()).await,
        Commands::Planning {
            config,
            output,
            iteration,
        } => planning_command(&config, &output, iteration).await,
        Commands::All { config, output } => all_command(&config, &output).await,
        Commands::Reports { config, output_dir } => reports_command(&config, &output_dir).await,
        Commands::Completions { shell } => {
            completions_command(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Failed to build report: {e}");
            ExitCode::FAILURE
        }
    }
}
