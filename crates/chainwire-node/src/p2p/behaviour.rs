use super::routing::PublicDialGate;
use libp2p::{
    autonat, gossipsub, identify, kad, ping, relay,
    swarm::{behaviour::toggle::Toggle, NetworkBehaviour},
};
use std::convert::Infallible;

#[derive(NetworkBehaviour)]
#[behaviour(to_swarm = "NodeBehaviourEvent")]
pub struct NodeBehaviour {
    pub kademlia: kad::Behaviour<kad::store::MemoryStore>,
    pub gossipsub: gossipsub::Behaviour,
    pub identify: identify::Behaviour,
    pub ping: ping::Behaviour,
    pub relay_client: Toggle<relay::client::Behaviour>,
    pub autonat: Toggle<autonat::Behaviour>,
    pub dial_gate: PublicDialGate,
}

#[derive(Debug)]
pub enum NodeBehaviourEvent {
    Kademlia(kad::Event),
    Gossipsub(gossipsub::Event),
    Identify(identify::Event),
    Ping(ping::Event),
    Relay(relay::client::Event),
    Autonat(autonat::Event),
}

impl From<Infallible> for NodeBehaviourEvent {
    fn from(event: Infallible) -> Self {
        match event {}
    }
}

impl From<kad::Event> for NodeBehaviourEvent {
    fn from(event: kad::Event) -> Self {
        NodeBehaviourEvent::Kademlia(event)
    }
}

impl From<gossipsub::Event> for NodeBehaviourEvent {
    fn from(event: gossipsub::Event) -> Self {
        NodeBehaviourEvent::Gossipsub(event)
    }
}

impl From<identify::Event> for NodeBehaviourEvent {
    fn from(event: identify::Event) -> Self {
        NodeBehaviourEvent::Identify(event)
    }
}

impl From<ping::Event> for NodeBehaviourEvent {
    fn from(event: ping::Event) -> Self {
        NodeBehaviourEvent::Ping(event)
    }
}

impl From<relay::client::Event> for NodeBehaviourEvent {
    fn from(event: relay::client::Event) -> Self {
        NodeBehaviourEvent::Relay(event)
    }
}

impl From<autonat::Event> for NodeBehaviourEvent {
    fn from(event: autonat::Event) -> Self {
        NodeBehaviourEvent::Autonat(event)
    }
}
