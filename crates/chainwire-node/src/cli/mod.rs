mod commands;
mod config_cmd;
mod init;
mod run;
mod utils;

pub use commands::{Cli, Commands, ConfigAction};
pub use config_cmd::handle_config;
pub use init::init_node;
pub use run::run_node;
pub use utils::init_logging;
