use super::filter::is_public_multiaddr;
use super::gate::PublicDialGate;
use super::mode::RoutingMode;
use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::kad::{self, store::MemoryStore};
use libp2p::{Multiaddr, PeerId, StreamProtocol};
use std::time::Duration;

const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Routing-table policy applied by the swarm loop: which addresses may enter
/// the table and which mode must be held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub mode: RoutingMode,
    pub public_only: bool,
}

impl RoutingPolicy {
    pub fn admits(&self, addr: &Multiaddr) -> bool {
        !self.public_only || is_public_multiaddr(addr)
    }

    pub fn admissible<'a, I>(&self, addrs: I) -> Vec<Multiaddr>
    where
        I: IntoIterator<Item = &'a Multiaddr>,
    {
        addrs.into_iter().filter(|a| self.admits(a)).cloned().collect()
    }
}

/// Builds the Kademlia behaviour for a network.
///
/// Peers only enter the routing table through the swarm loop, which admits
/// publicly routable addresses when `public_only` is set. Queries also dial
/// peers learned from remote responses, outside the table; those dials are
/// bounded by the [`PublicDialGate`] this configurator hands out. Value and
/// provider records are never stored or republished.
#[derive(Clone, Debug)]
pub struct RoutingConfigurator {
    mode: RoutingMode,
    protocol_prefix: String,
    public_only: bool,
}

impl RoutingConfigurator {
    pub fn new(mode: RoutingMode, protocol_prefix: impl Into<String>, public_only: bool) -> Self {
        Self {
            mode,
            protocol_prefix: protocol_prefix.into(),
            public_only,
        }
    }

    /// Configurator for the named network, using `/fil/kad/<name>` as prefix.
    pub fn for_network(mode: RoutingMode, network_name: &str) -> Self {
        Self::new(mode, super::super::protocol_prefix(network_name), true)
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    pub fn policy(&self) -> RoutingPolicy {
        RoutingPolicy {
            mode: self.mode,
            public_only: self.public_only,
        }
    }

    /// The connection gate that enforces `public_only` on query dials.
    pub fn dial_gate(&self) -> PublicDialGate {
        PublicDialGate::new(self.public_only)
    }

    pub fn protocol(&self) -> ChainwireResult<StreamProtocol> {
        StreamProtocol::try_from_owned(format!("{}/kad/1.0.0", self.protocol_prefix))
            .map_err(|e| ChainwireError::Config(format!("Invalid routing protocol: {}", e)))
    }

    pub fn kad_config(&self) -> ChainwireResult<kad::Config> {
        let mut config = kad::Config::new(self.protocol()?);
        config
            .set_kbucket_inserts(kad::BucketInserts::Manual)
            .set_record_filtering(kad::StoreInserts::FilterBoth)
            .set_publication_interval(None)
            .set_provider_publication_interval(None)
            .set_replication_interval(None)
            .set_query_timeout(QUERY_TIMEOUT);
        Ok(config)
    }

    pub fn configure(&self, local_peer_id: PeerId) -> ChainwireResult<kad::Behaviour<MemoryStore>> {
        let store = MemoryStore::new(local_peer_id);
        let mut kademlia = kad::Behaviour::with_config(local_peer_id, store, self.kad_config()?);
        kademlia.set_mode(self.mode.kad_mode());
        Ok(kademlia)
    }
}
