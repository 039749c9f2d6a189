use super::commands::ConfigAction;
use chainwire_node::NodeConfig;
use chainwire_types::{ChainwireError, ChainwireResult};
use std::path::Path;

pub fn handle_config(config_path: &Path, action: Option<&ConfigAction>) -> ChainwireResult<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            if !config_path.exists() {
                println!("\x1b[38;5;245mNo configuration file at {:?}, showing defaults\x1b[0m", config_path);
            }
            let config = NodeConfig::load(config_path)?;
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| ChainwireError::Config(format!("Failed to render config: {}", e)))?;
            println!("{}", rendered);
        }
        Some(ConfigAction::Validate) => {
            if config_path.exists() {
                match NodeConfig::load(config_path) {
                    Ok(_) => println!("\x1b[38;5;46m[+]\x1b[0m Configuration is valid"),
                    Err(e) => println!("\x1b[38;5;196m[-]\x1b[0m Configuration error: {}", e),
                }
            } else {
                println!("\x1b[38;5;245mNo configuration file found at {:?}\x1b[0m", config_path);
                println!("Run '\x1b[38;5;51mchainwire init\x1b[0m' to create one");
            }
        }
    }
    Ok(())
}
