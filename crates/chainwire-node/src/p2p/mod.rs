mod behaviour;
mod builder;
mod events;
mod guard;
mod helpers;
mod hello;
mod host;
mod peermgr;
mod routed;
mod routing;
mod swarm;
mod types;

pub use behaviour::{NodeBehaviour, NodeBehaviourEvent};
pub use builder::{advertised_addresses, HostBuilder, HostOptions};
pub use events::log_network_events;
pub use guard::{ConnectionGuard, ConnectionWatermarks};
pub use helpers::{extract_peer_id, parse_bootstrap_addresses, parse_multiaddrs};
pub use hello::HelloService;
pub use host::Host;
pub use peermgr::BootstrapPeerManager;
pub use routed::RoutedHost;
pub use routing::{
    is_public_ipv4, is_public_ipv6, is_public_multiaddr, KadRouter, PublicDialGate,
    RoutingConfigurator, RoutingMode, RoutingPolicy,
};
pub use types::{
    BackoffStrategy, NetworkCommand, NetworkEvent, NetworkStats, NetworkStatsSnapshot,
    PeerAddress, PeerInfo, Reply,
};

pub const IDENTIFY_PROTOCOL: &str = "/chainwire/id/1.0.0";

pub fn agent_version() -> String {
    format!("chainwire/{}", env!("CARGO_PKG_VERSION"))
}

/// Routing protocol prefix for a network; the routing protocol id is this
/// prefix followed by `/kad/1.0.0`.
pub fn protocol_prefix(network_name: &str) -> String {
    format!("/fil/kad/{}", network_name)
}

pub mod topics {
    pub fn blocks(network_name: &str) -> String {
        format!("/fil/blocks/{}", network_name)
    }

    pub fn messages(network_name: &str) -> String {
        format!("/fil/msgs/{}", network_name)
    }

    pub fn hello(network_name: &str) -> String {
        format!("/fil/hello/{}", network_name)
    }
}

#[cfg(test)]
mod tests;
