use super::host::Host;
use super::types::NetworkEvent;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Drains a host's event stream into the log. Returns once the host's event
/// loop has stopped.
pub async fn log_network_events(host: Host, mut events: mpsc::Receiver<NetworkEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            NetworkEvent::PeerConnected(peer) => match host.get_peer(&peer) {
                Some(info) => info!(
                    "Peer {} connected via {} (protected: {})",
                    peer,
                    info.addresses.join(", "),
                    info.protected
                ),
                None => info!("Peer {} connected", peer),
            },
            NetworkEvent::PeerDisconnected(peer) => info!("Peer {} disconnected", peer),
            NetworkEvent::ConnectionTrimmed(peer) => info!("Trimmed connection to {}", peer),
            NetworkEvent::PeerDiscovered(peer, addrs) => {
                debug!("Discovered {} at {} address(es)", peer, addrs.len())
            }
            NetworkEvent::PingResult { peer, rtt } => debug!("Ping {}: {:?}", peer, rtt),
            NetworkEvent::Message { topic, source, data } => {
                debug!("{} bytes on {} from {}", data.len(), topic, source)
            }
        }
    }
    debug!("Network event stream closed ({} peers at close)", host.peer_count());
}
