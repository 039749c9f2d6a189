use super::types::PeerAddress;
use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};

pub fn extract_peer_id(addr: &Multiaddr) -> Option<PeerId> {
    addr.iter().find_map(|p| match p {
        Protocol::P2p(peer_id) => Some(peer_id),
        _ => None,
    })
}

/// Parses bootstrap multiaddrs, merging entries that name the same peer.
/// Order of first appearance is preserved.
pub fn parse_bootstrap_addresses(entries: &[String]) -> ChainwireResult<Vec<PeerAddress>> {
    let mut peers: Vec<PeerAddress> = Vec::new();

    for entry in entries {
        let addr: Multiaddr = entry
            .trim()
            .parse()
            .map_err(|e| ChainwireError::InvalidAddress(format!("{}: {}", entry, e)))?;
        let parsed = PeerAddress::from_multiaddr(&addr)?;

        match peers.iter_mut().find(|p| p.peer_id() == parsed.peer_id()) {
            Some(existing) => existing.merge(parsed),
            None => peers.push(parsed),
        }
    }

    Ok(peers)
}

pub fn parse_multiaddrs(entries: &[String]) -> ChainwireResult<Vec<Multiaddr>> {
    entries
        .iter()
        .map(|s| {
            s.parse::<Multiaddr>()
                .map_err(|e| ChainwireError::InvalidAddress(format!("{}: {}", s, e)))
        })
        .collect()
}
