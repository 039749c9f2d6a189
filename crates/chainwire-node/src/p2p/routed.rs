use super::host::Host;
use super::types::PeerAddress;
use crate::capability::{PeerConnector, Routing};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::ChainwireResult;
use libp2p::PeerId;
use std::sync::Arc;
use tracing::debug;

/// A host that asks the router for addresses when dialing a peer it has no
/// addresses for.
#[derive(Clone)]
pub struct RoutedHost {
    host: Host,
    router: Arc<dyn Routing>,
}

impl RoutedHost {
    pub fn new(host: Host, router: Arc<dyn Routing>) -> Self {
        Self { host, router }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn router(&self) -> &Arc<dyn Routing> {
        &self.router
    }
}

#[async_trait]
impl PeerConnector for RoutedHost {
    fn connected_peers(&self) -> usize {
        self.host.peer_count()
    }

    fn is_connected(&self, peer: &PeerId) -> bool {
        PeerConnector::is_connected(&self.host, peer)
    }

    async fn connect(&self, ctx: &Context, peer: &PeerAddress) -> ChainwireResult<()> {
        if !peer.addresses().is_empty() || !self.host.known_addresses(&peer.peer_id()).is_empty() {
            return self.host.connect(ctx, peer).await;
        }

        debug!("No addresses for {}, asking the router", peer.peer_id());
        let resolved = self.router.find_peer(ctx, peer.peer_id()).await?;
        self.host.connect(ctx, &resolved).await
    }
}
