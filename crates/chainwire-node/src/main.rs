mod cli;

use chainwire_node::LoggingConfig;
use chainwire_types::ChainwireResult;
use clap::Parser;
use cli::{handle_config, init_logging, init_node, run_node, Cli, Commands};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> ChainwireResult<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .map(|h| h.join(".chainwire"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/chainwire"))
    });

    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join("config.toml"));

    match &cli.command {
        Commands::Run => {
            run_node(&cli, &config_path).await?;
        }
        Commands::Init { force } => {
            init_logging(&cli, &LoggingConfig::default())?;
            init_node(&config_path, &data_dir, *force)?;
        }
        Commands::Config { action } => {
            init_logging(&cli, &LoggingConfig::default())?;
            handle_config(&config_path, action.as_ref())?;
        }
    }

    Ok(())
}
