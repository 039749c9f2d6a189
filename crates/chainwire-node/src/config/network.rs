use serde::{Deserialize, Serialize};

use super::constants::*;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Derive the network name from genesis state instead of using the
    /// well-known mainnet name.
    pub devnet: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub listen_addresses: Vec<String>,
    pub relay: bool,
    pub public_relay_address: String,
    pub static_relays: Vec<String>,
    pub conn_mgr_low: u32,
    pub conn_mgr_high: u32,
    pub conn_mgr_grace: String,
    pub protected_peers: Vec<String>,
    pub idle_timeout_secs: u64,
    pub dial_timeout_secs: u64,
    pub max_message_size: usize,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            listen_addresses: vec![
                format!("/ip4/0.0.0.0/tcp/{}", DEFAULT_P2P_PORT),
                format!("/ip6/::/tcp/{}", DEFAULT_P2P_PORT),
            ],
            relay: false,
            public_relay_address: String::new(),
            static_relays: Vec::new(),
            conn_mgr_low: DEFAULT_CONN_MGR_LOW,
            conn_mgr_high: DEFAULT_CONN_MGR_HIGH,
            conn_mgr_grace: DEFAULT_CONN_MGR_GRACE.to_string(),
            protected_peers: Vec::new(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT_SECS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub addresses: Vec<String>,
    pub period: String,
    pub min_peers: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            period: DEFAULT_BOOTSTRAP_PERIOD.to_string(),
            min_peers: DEFAULT_MIN_PEERS,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PubsubConfig {
    /// The node serves as a rendezvous point for the rest of the network.
    pub bootstrapper: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub initial_delay: String,
    pub max_delay: String,
    pub attempts: u32,
    pub factor: f64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_TRANSFER_INITIAL_DELAY.to_string(),
            max_delay: DEFAULT_TRANSFER_MAX_DELAY.to_string(),
            attempts: DEFAULT_TRANSFER_ATTEMPTS,
            factor: DEFAULT_TRANSFER_FACTOR,
        }
    }
}
