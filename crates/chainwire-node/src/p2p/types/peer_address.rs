use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};
use std::fmt;

/// A peer id together with the transport addresses it is reachable at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerAddress {
    peer_id: PeerId,
    addresses: Vec<Multiaddr>,
}

impl PeerAddress {
    pub fn new(peer_id: PeerId, addresses: Vec<Multiaddr>) -> Self {
        Self { peer_id, addresses }
    }

    /// Splits a `<transport>/p2p/<peer-id>` multiaddr into its parts.
    pub fn from_multiaddr(addr: &Multiaddr) -> ChainwireResult<Self> {
        let mut transport = addr.clone();
        match transport.pop() {
            Some(Protocol::P2p(peer_id)) => {
                let addresses = if transport.is_empty() {
                    Vec::new()
                } else {
                    vec![transport]
                };
                Ok(Self { peer_id, addresses })
            }
            _ => Err(ChainwireError::InvalidAddress(format!(
                "{} does not end in /p2p/<peer-id>",
                addr
            ))),
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn addresses(&self) -> &[Multiaddr] {
        &self.addresses
    }

    pub(crate) fn merge(&mut self, other: PeerAddress) {
        for addr in other.addresses {
            if !self.addresses.contains(&addr) {
                self.addresses.push(addr);
            }
        }
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} addresses)", self.peer_id, self.addresses.len())
    }
}
