use chainwire_types::ChainwireResult;
use libp2p::{Multiaddr, PeerId};
use std::time::Duration;
use tokio::sync::oneshot;

pub type Reply<T> = oneshot::Sender<ChainwireResult<T>>;

#[derive(Debug)]
pub enum NetworkCommand {
    Dial {
        peer: PeerId,
        addresses: Vec<Multiaddr>,
        reply: Reply<()>,
    },
    Disconnect(PeerId),
    Publish {
        topic: String,
        data: Vec<u8>,
        reply: Reply<()>,
    },
    Subscribe {
        topic: String,
        reply: Reply<()>,
    },
    Unsubscribe {
        topic: String,
        reply: Reply<()>,
    },
    AddAddress(PeerId, Multiaddr),
    Bootstrap {
        reply: Reply<()>,
    },
    FindPeer {
        peer: PeerId,
        reply: Reply<Vec<Multiaddr>>,
    },
    CloseRouting,
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum NetworkEvent {
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
    Message { topic: String, source: PeerId, data: Vec<u8> },
    PeerDiscovered(PeerId, Vec<Multiaddr>),
    PingResult { peer: PeerId, rtt: Duration },
    ConnectionTrimmed(PeerId),
}
