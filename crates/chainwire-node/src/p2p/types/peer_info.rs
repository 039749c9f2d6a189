use libp2p::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: String,
    pub addresses: Vec<String>,
    pub connected_at: chrono::DateTime<chrono::Utc>,
    pub latency_ms: Option<u32>,
    pub protocol_version: Option<String>,
    pub agent_version: Option<String>,
    pub protected: bool,
}

impl Default for PeerInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            addresses: Vec::new(),
            connected_at: chrono::Utc::now(),
            latency_ms: None,
            protocol_version: None,
            agent_version: None,
            protected: false,
        }
    }
}

impl PeerInfo {
    pub fn new(peer_id: PeerId, addresses: Vec<String>) -> Self {
        Self {
            id: peer_id.to_string(),
            addresses,
            connected_at: chrono::Utc::now(),
            ..Default::default()
        }
    }

    pub fn connected_secs(&self) -> i64 {
        (chrono::Utc::now() - self.connected_at).num_seconds().max(0)
    }
}
