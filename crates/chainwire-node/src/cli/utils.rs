use super::commands::Cli;
use chainwire_node::LoggingConfig;
use chainwire_types::{ChainwireError, ChainwireResult};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs the global subscriber. Command-line flags win over the
/// `[logging]` section; `RUST_LOG` wins over both.
pub fn init_logging(cli: &Cli, logging: &LoggingConfig) -> ChainwireResult<()> {
    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => logging.filter(),
            1 => format!("{},chainwire_node=debug", logging.filter()),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let log_file = cli.log_file.as_ref().or(logging.file.as_ref());
    let writer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ChainwireError::Config(format!("Failed to open log file {:?}: {}", path, e)))?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if cli.json_logs || logging.json {
        subscriber
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(log_file.is_none())
                    .with_target(cli.verbose >= 2),
            )
            .try_init()
    };

    result.map_err(|e| ChainwireError::Internal(format!("Failed to install logger: {}", e)))
}

pub fn print_banner() {
    println!();
    println!("  \x1b[1;38;5;39mchainwire\x1b[0m \x1b[38;5;245mv{}\x1b[0m", BUILD_VERSION);
    println!("  \x1b[38;5;245mpeer-to-peer transport and block retrieval\x1b[0m");
    println!();
}
