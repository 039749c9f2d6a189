use chainwire_node::{NodeConfig, NodeStorage, StorageConfig};
use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::PeerId;
use std::path::Path;

pub fn init_node(config_path: &Path, data_dir: &Path, force: bool) -> ChainwireResult<()> {
    println!("\x1b[38;5;39mInitializing chainwire node...\x1b[0m");
    println!();

    if config_path.exists() && !force {
        println!("\x1b[38;5;226mConfiguration already exists at {:?}\x1b[0m", config_path);
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::create_dir_all(data_dir)
        .map_err(|e| ChainwireError::Config(format!("Failed to create data directory: {}", e)))?;

    let config = NodeConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    config.save(config_path)?;
    println!("\x1b[38;5;46m[+]\x1b[0m Wrote configuration to {:?}", config_path);

    let storage = NodeStorage::open(StorageConfig::at(config.blocks_path()))?;
    let keypair = storage.load_or_create_keypair()?;
    storage.flush()?;
    println!(
        "\x1b[38;5;46m[+]\x1b[0m Node identity: {}",
        PeerId::from(keypair.public())
    );

    println!();
    println!("Next steps:");
    println!("  1. Add bootstrap peers under [bootstrap] in {:?}", config_path);
    println!("  2. Start the node: \x1b[38;5;51mchainwire run\x1b[0m");

    Ok(())
}
