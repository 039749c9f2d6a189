use super::*;
use crate::capability::{Closeable, Routing};
use crate::p2p::types::NetworkCommand;
use crate::supervisor::Context;
use futures::StreamExt;
use libp2p::swarm::{NetworkBehaviour, SwarmEvent};
use libp2p::{kad, noise, tcp, yamux, Multiaddr, PeerId, Swarm, SwarmBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Span;

#[test]
fn test_mode_for_node() {
    assert_eq!(RoutingMode::for_node(true), RoutingMode::Server);
    assert_eq!(RoutingMode::for_node(false), RoutingMode::Auto);
}

#[test]
fn test_server_mode_never_degrades() {
    let mode = RoutingMode::Server;
    assert_eq!(mode.correction(kad::Mode::Client), Some(kad::Mode::Server));
    assert_eq!(mode.correction(kad::Mode::Server), None);

    let configurator = RoutingConfigurator::for_network(RoutingMode::Server, "testnetnet");
    assert!(configurator.configure(PeerId::random()).is_ok());
    assert_eq!(configurator.policy().mode, RoutingMode::Server);
}

#[test]
fn test_auto_mode_accepts_observed_changes() {
    let mode = RoutingMode::Auto;
    assert_eq!(mode.correction(kad::Mode::Client), None);
    assert_eq!(mode.correction(kad::Mode::Server), None);
}

#[test]
fn test_protocol_name() {
    let configurator = RoutingConfigurator::for_network(RoutingMode::Auto, "testnetnet");
    assert_eq!(
        configurator.protocol().unwrap().as_ref(),
        "/fil/kad/testnetnet/kad/1.0.0"
    );
}

#[test]
fn test_invalid_prefix_rejected() {
    let configurator = RoutingConfigurator::new(RoutingMode::Auto, "no-leading-slash", true);
    assert!(configurator.protocol().is_err());
}

#[test]
fn test_policy_admits_public_only() {
    let policy = RoutingConfigurator::for_network(RoutingMode::Auto, "n").policy();
    let addrs: Vec<Multiaddr> = vec![
        "/ip4/192.168.0.2/tcp/1347".parse().unwrap(),
        "/ip4/8.8.4.4/tcp/1347".parse().unwrap(),
        "/ip4/127.0.0.1/tcp/1347".parse().unwrap(),
    ];
    assert_eq!(policy.admissible(&addrs), vec![addrs[1].clone()]);

    let open = RoutingPolicy {
        mode: RoutingMode::Auto,
        public_only: false,
    };
    assert_eq!(open.admissible(&addrs).len(), 3);
}

#[tokio::test]
async fn test_router_forwards_bootstrap() {
    let (tx, mut rx) = mpsc::channel(4);
    let router = KadRouter::new(tx, RoutingMode::Server, Span::none());

    let loop_side = tokio::spawn(async move {
        match rx.recv().await {
            Some(NetworkCommand::Bootstrap { reply }) => {
                let _ = reply.send(Ok(()));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    });

    router.bootstrap().await.unwrap();
    loop_side.await.unwrap();
    assert_eq!(router.mode(), RoutingMode::Server);
}

#[tokio::test]
async fn test_find_peer_honours_cancellation() {
    let (tx, _rx) = mpsc::channel(4);
    let router = KadRouter::new(tx, RoutingMode::Auto, Span::none());
    let ctx = Context::background();
    ctx.cancel();

    let result = router.find_peer(&ctx, PeerId::random()).await;
    assert!(matches!(result, Err(chainwire_types::ChainwireError::Cancelled)));
}

#[tokio::test]
async fn test_closed_router_refuses_work() {
    let (tx, mut rx) = mpsc::channel(4);
    let router = KadRouter::new(tx, RoutingMode::Auto, Span::none());

    router.close().await.unwrap();
    router.close().await.unwrap();
    assert!(router.is_closed());
    assert!(matches!(rx.recv().await, Some(NetworkCommand::CloseRouting)));
    assert!(router.bootstrap().await.is_err());
}

#[test]
fn test_dial_gate_admits_public_and_allowed_peers() {
    let private: Multiaddr = "/ip4/127.0.0.1/tcp/1347".parse().unwrap();
    let public: Multiaddr = "/ip4/8.8.4.4/tcp/1347".parse().unwrap();
    let peer = PeerId::random();

    let mut gate = RoutingConfigurator::for_network(RoutingMode::Auto, "n").dial_gate();
    assert!(gate.permits(&peer, &public));
    assert!(!gate.permits(&peer, &private));
    gate.allow(peer);
    assert!(gate.permits(&peer, &private));
    assert!(!gate.permits(&PeerId::random(), &private));

    let open = RoutingConfigurator::new(RoutingMode::Auto, "/fil/kad/n", false).dial_gate();
    assert!(open.permits(&peer, &private));
}

const TEST_PREFIX: &str = "/fil/kad/localnet";

fn loopback_swarm<B, F>(make: F) -> Swarm<B>
where
    B: NetworkBehaviour,
    F: FnOnce(PeerId) -> B,
{
    SwarmBuilder::with_new_identity()
        .with_tokio()
        .with_tcp(tcp::Config::default(), noise::Config::new, yamux::Config::default)
        .unwrap()
        .with_behaviour(|key| make(key.public().to_peer_id()))
        .unwrap()
        .with_swarm_config(|c| c.with_idle_connection_timeout(Duration::from_secs(30)))
        .build()
}

async fn listen<B: NetworkBehaviour>(swarm: &mut Swarm<B>) -> Multiaddr {
    swarm.listen_on("/ip4/127.0.0.1/tcp/0".parse().unwrap()).unwrap();
    loop {
        if let SwarmEvent::NewListenAddr { address, .. } = swarm.select_next_some().await {
            return address;
        }
    }
}

fn drive<B>(mut swarm: Swarm<B>)
where
    B: NetworkBehaviour + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            swarm.select_next_some().await;
        }
    });
}

fn kademlia(mode: RoutingMode, public_only: bool, local: PeerId) -> kad::Behaviour<kad::store::MemoryStore> {
    RoutingConfigurator::new(mode, TEST_PREFIX, public_only)
        .configure(local)
        .unwrap()
}

#[tokio::test]
async fn test_server_mode_answers_without_external_address() {
    let mut server = loopback_swarm(|id| kademlia(RoutingMode::Server, false, id));
    let server_id = *server.local_peer_id();
    let server_addr = listen(&mut server).await;
    assert_eq!(server.external_addresses().count(), 0);

    let (served_tx, mut served_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            if let SwarmEvent::Behaviour(kad::Event::InboundRequest {
                request: kad::InboundRequest::FindNode { .. },
            }) = server.select_next_some().await
            {
                let _ = served_tx.send(());
            }
        }
    });

    let mut client = loopback_swarm(|id| kademlia(RoutingMode::Client, false, id));
    client.behaviour_mut().add_address(&server_id, server_addr);
    client.behaviour_mut().get_closest_peers(PeerId::random());

    tokio::time::timeout(Duration::from_secs(20), async {
        loop {
            tokio::select! {
                served = served_rx.recv() => {
                    assert!(served.is_some());
                    break;
                }
                _ = client.select_next_some() => {}
            }
        }
    })
    .await
    .expect("server-mode node never answered a routing query");
}

#[derive(NetworkBehaviour)]
struct GatedRouting {
    kademlia: kad::Behaviour<kad::store::MemoryStore>,
    gate: PublicDialGate,
}

fn gated(public_only: bool) -> Swarm<GatedRouting> {
    loopback_swarm(|id| GatedRouting {
        kademlia: kademlia(RoutingMode::Server, public_only, id),
        gate: PublicDialGate::new(public_only),
    })
}

/// Runs a lookup for a peer that only the intermediary knows, at a loopback
/// address, and returns everyone the querying node connected to.
async fn lookup_through_intermediary(public_only: bool) -> (PeerId, PeerId, HashSet<PeerId>) {
    let mut target = gated(false);
    let target_id = *target.local_peer_id();
    let target_addr = listen(&mut target).await;

    let mut intermediary = gated(false);
    let intermediary_id = *intermediary.local_peer_id();
    let intermediary_addr = listen(&mut intermediary).await;
    intermediary
        .behaviour_mut()
        .kademlia
        .add_address(&target_id, target_addr);

    drive(target);
    drive(intermediary);

    let mut querier = gated(public_only);
    querier.behaviour_mut().gate.allow(intermediary_id);
    querier
        .behaviour_mut()
        .kademlia
        .add_address(&intermediary_id, intermediary_addr);
    let query = querier.behaviour_mut().kademlia.get_closest_peers(target_id);

    let mut connected = HashSet::new();
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match querier.select_next_some().await {
                SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                    connected.insert(peer_id);
                }
                SwarmEvent::Behaviour(GatedRoutingEvent::Kademlia(
                    kad::Event::OutboundQueryProgressed { id, step, .. },
                )) if id == query && step.last => break,
                _ => {}
            }
        }
    })
    .await
    .expect("lookup never finished");

    (intermediary_id, target_id, connected)
}

#[tokio::test]
async fn test_queries_never_dial_private_peers() {
    let (intermediary, target, connected) = lookup_through_intermediary(true).await;
    assert!(connected.contains(&intermediary));
    assert!(!connected.contains(&target));
}

#[tokio::test]
async fn test_open_policy_dials_private_peers() {
    let (intermediary, target, connected) = lookup_through_intermediary(false).await;
    assert!(connected.contains(&intermediary));
    assert!(connected.contains(&target));
}
