use super::filter::is_public_multiaddr;
use chainwire_types::ChainwireError;
use libp2p::core::transport::PortUse;
use libp2p::core::Endpoint;
use libp2p::swarm::{
    dummy, ConnectionDenied, ConnectionId, FromSwarm, NetworkBehaviour, THandler,
    THandlerInEvent, THandlerOutEvent, ToSwarm,
};
use libp2p::{Multiaddr, PeerId};
use std::collections::HashSet;
use std::convert::Infallible;
use std::task::{Context, Poll};

/// Refuses outbound connections to non-public addresses, except to peers
/// that were dialled explicitly.
///
/// Routing queries dial whatever peers remote nodes return, at whatever
/// addresses they report, without consulting the routing table. With
/// `public_only` set this behaviour is what keeps those dials off private
/// and loopback networks.
#[derive(Debug, Default)]
pub struct PublicDialGate {
    public_only: bool,
    allowed: HashSet<PeerId>,
}

impl PublicDialGate {
    pub fn new(public_only: bool) -> Self {
        Self {
            public_only,
            allowed: HashSet::new(),
        }
    }

    /// Exempts `peer` from the address check for the rest of the session.
    pub fn allow(&mut self, peer: PeerId) {
        if self.public_only {
            self.allowed.insert(peer);
        }
    }

    pub fn permits(&self, peer: &PeerId, addr: &Multiaddr) -> bool {
        !self.public_only || self.allowed.contains(peer) || is_public_multiaddr(addr)
    }
}

impl NetworkBehaviour for PublicDialGate {
    type ConnectionHandler = dummy::ConnectionHandler;
    type ToSwarm = Infallible;

    fn handle_established_inbound_connection(
        &mut self,
        _connection_id: ConnectionId,
        _peer: PeerId,
        _local_addr: &Multiaddr,
        _remote_addr: &Multiaddr,
    ) -> Result<THandler<Self>, ConnectionDenied> {
        Ok(dummy::ConnectionHandler)
    }

    fn handle_established_outbound_connection(
        &mut self,
        _connection_id: ConnectionId,
        peer: PeerId,
        addr: &Multiaddr,
        _role_override: Endpoint,
        _port_use: PortUse,
    ) -> Result<THandler<Self>, ConnectionDenied> {
        if self.permits(&peer, addr) {
            Ok(dummy::ConnectionHandler)
        } else {
            Err(ConnectionDenied::new(ChainwireError::Routing(format!(
                "refusing non-public address {} of {}",
                addr, peer
            ))))
        }
    }

    fn on_swarm_event(&mut self, _event: FromSwarm) {}

    fn on_connection_handler_event(
        &mut self,
        _peer: PeerId,
        _connection_id: ConnectionId,
        event: THandlerOutEvent<Self>,
    ) {
        match event {}
    }

    fn poll(&mut self, _cx: &mut Context<'_>) -> Poll<ToSwarm<Self::ToSwarm, THandlerInEvent<Self>>> {
        Poll::Pending
    }
}
