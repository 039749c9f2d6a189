use chainwire_types::{ChainwireError, ChainwireResult, ContentId};
use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::duration::parse_duration;
use super::logging::LoggingConfig;
use super::network::{BootstrapConfig, NetworkParams, PubsubConfig, SwarmConfig, TransferConfig};
use super::types::LogLevel;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    /// Hex content id of the genesis block.
    pub genesis: String,
    pub offline: bool,
    pub network: NetworkParams,
    pub swarm: SwarmConfig,
    pub bootstrap: BootstrapConfig,
    pub pubsub: PubsubConfig,
    pub transfer: TransferConfig,
    pub logging: LoggingConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/var/lib/chainwire"));

        Self {
            data_dir: home.join(".chainwire"),
            genesis: ContentId::zero().to_hex(),
            offline: false,
            network: NetworkParams::default(),
            swarm: SwarmConfig::default(),
            bootstrap: BootstrapConfig::default(),
            pubsub: PubsubConfig::default(),
            transfer: TransferConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn load(path: impl AsRef<std::path::Path>) -> ChainwireResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ChainwireError::Config(format!("Failed to read config: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| ChainwireError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> ChainwireResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ChainwireError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChainwireError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| ChainwireError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("CHAINWIRE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Ok(genesis) = std::env::var("CHAINWIRE_GENESIS") {
            self.genesis = genesis;
        }

        if let Ok(offline) = std::env::var("CHAINWIRE_OFFLINE") {
            self.offline = matches!(offline.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(level) = std::env::var("CHAINWIRE_LOG_LEVEL") {
            self.logging.level = LogLevel::parse_lenient(&level);
        }

        if std::env::var("CHAINWIRE_LOG_JSON").is_ok() {
            self.logging.json = true;
        }

        if let Ok(nodes) = std::env::var("CHAINWIRE_BOOTSTRAP_NODES") {
            self.bootstrap.addresses = nodes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(addr) = std::env::var("CHAINWIRE_PUBLIC_RELAY_ADDRESS") {
            self.swarm.public_relay_address = addr;
        }
    }

    pub fn validate(&self) -> ChainwireResult<()> {
        self.genesis_id()?;

        if self.swarm.conn_mgr_low > self.swarm.conn_mgr_high {
            return Err(ChainwireError::InvalidWatermarks {
                low: self.swarm.conn_mgr_low,
                high: self.swarm.conn_mgr_high,
            });
        }
        self.conn_mgr_grace()?;
        self.bootstrap_period()?;
        parse_duration(&self.transfer.initial_delay)?;
        parse_duration(&self.transfer.max_delay)?;

        if self.transfer.factor < 1.0 {
            return Err(ChainwireError::Config(
                "Transfer retry factor must be at least 1".into(),
            ));
        }

        for addr in &self.swarm.listen_addresses {
            addr.parse::<Multiaddr>().map_err(|e| {
                ChainwireError::InvalidAddress(format!("listen address {}: {}", addr, e))
            })?;
        }

        if self.swarm.relay && !self.swarm.public_relay_address.is_empty() {
            self.swarm
                .public_relay_address
                .parse::<Multiaddr>()
                .map_err(|e| ChainwireError::InvalidAddress(format!("public relay address: {}", e)))?;
        }

        if self.swarm.max_message_size < 1024 {
            return Err(ChainwireError::Config(
                "Max message size must be at least 1024 bytes".into(),
            ));
        }

        if self.bootstrap.addresses.is_empty() && !self.offline {
            warn!("No bootstrap addresses configured - node will rely on inbound connections");
        }

        Ok(())
    }

    pub fn genesis_id(&self) -> ChainwireResult<ContentId> {
        ContentId::from_hex(&self.genesis)
            .map_err(|e| ChainwireError::Config(format!("Invalid genesis content id: {}", e)))
    }

    pub fn conn_mgr_grace(&self) -> ChainwireResult<Duration> {
        parse_duration(&self.swarm.conn_mgr_grace)
    }

    pub fn bootstrap_period(&self) -> ChainwireResult<Duration> {
        parse_duration(&self.bootstrap.period)
    }

    pub fn blocks_path(&self) -> PathBuf {
        self.data_dir.join("blocks")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }
}
