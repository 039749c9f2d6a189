use clap::{Parser, Subcommand};
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "chainwire")]
#[command(version = BUILD_VERSION)]
#[command(about = "chainwire - Peer-to-peer transport and block retrieval for chain nodes")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'd', long, global = true, value_name = "DIR", env = "CHAINWIRE_DATA_DIR", help = "Data directory path")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the node")]
    #[command(long_about = "Start the chainwire node.\n\nAssembles the libp2p host, joins the routing overlay and keeps bootstrap connections alive until SIGINT or SIGTERM.")]
    Run,

    #[command(about = "Initialize a new node")]
    #[command(long_about = "Write a default configuration and generate the node keypair.")]
    Init {
        #[arg(short, long, help = "Overwrite existing configuration")]
        force: bool,
    },

    #[command(about = "Inspect configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Print the effective configuration")]
    Show,
    #[command(about = "Validate the configuration file")]
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_globals() {
        let cli = Cli::try_parse_from(["chainwire", "-vv", "--json-logs", "run"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn test_parse_init_force() {
        let cli = Cli::try_parse_from(["chainwire", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }

    #[test]
    fn test_config_action_optional() {
        let cli = Cli::try_parse_from(["chainwire", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: None }));

        let cli = Cli::try_parse_from(["chainwire", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config { action: Some(ConfigAction::Validate) }
        ));
    }
}
