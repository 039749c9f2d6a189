use super::*;
use crate::capability::{Closeable, HelloProtocol, PeerConnector, PubSub, Routing};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::{ChainwireError, ChainwireResult, ContentId, NetworkIdentity};
use libp2p::identity::Keypair;
use libp2p::{Multiaddr, PeerId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::Span;

#[test]
fn test_protocol_names() {
    assert_eq!(protocol_prefix("testnetnet"), "/fil/kad/testnetnet");
    assert_eq!(topics::blocks("testnetnet"), "/fil/blocks/testnetnet");
    assert_eq!(topics::messages("localnet"), "/fil/msgs/localnet");
    assert!(agent_version().starts_with("chainwire/"));
}

#[derive(Default)]
struct RecordingPubSub {
    subscribed: Mutex<Vec<String>>,
}

#[async_trait]
impl PubSub for RecordingPubSub {
    async fn publish(&self, _topic: &str, _data: Vec<u8>) -> ChainwireResult<()> {
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> ChainwireResult<()> {
        self.subscribed.lock().push(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, _topic: &str) -> ChainwireResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_hello_registers_once() {
    let pubsub = Arc::new(RecordingPubSub::default());
    let hello = HelloService::new(
        pubsub.clone(),
        NetworkIdentity {
            name: "localnet".into(),
            genesis: ContentId::zero(),
        },
    );

    hello.register().await.unwrap();
    hello.register().await.unwrap();

    assert!(hello.is_registered());
    assert_eq!(*pubsub.subscribed.lock(), vec!["/fil/hello/localnet".to_string()]);
}

fn loopback_host() -> Host {
    host_with_routing(RoutingConfigurator::new(RoutingMode::Server, "/fil/kad/localnet", false))
}

fn host_with_routing(routing: RoutingConfigurator) -> Host {
    let options = HostOptions {
        listen_addresses: vec!["/ip4/127.0.0.1/tcp/0".parse().unwrap()],
        ..Default::default()
    };
    let guard = Arc::new(
        ConnectionGuard::new(
            ConnectionWatermarks::new(10, 20, Duration::from_secs(20)).unwrap(),
            &[],
            &[],
            Span::none(),
        )
        .unwrap(),
    );

    HostBuilder::new(options, Span::none())
        .build(Keypair::generate_ed25519(), &routing, guard, &[])
        .unwrap()
}

async fn wait_for_listen(host: &Host) -> Multiaddr {
    for _ in 0..100 {
        if let Some(addr) = host.addresses().into_iter().next() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("host never started listening");
}

#[tokio::test]
async fn test_two_hosts_connect_and_close() {
    let a = loopback_host();
    let b = loopback_host();
    let addr = wait_for_listen(&b).await;

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    a.connect(&ctx, &PeerAddress::new(b.local_peer_id(), vec![addr]))
        .await
        .unwrap();

    assert!(PeerConnector::is_connected(&a, &b.local_peer_id()));
    assert_eq!(a.connected_peers(), 1);

    a.close().await.unwrap();
    a.close().await.unwrap();
    assert!(a.is_closed());
    b.close().await.unwrap();

    let after = a.connect(&ctx, &PeerAddress::new(PeerId::random(), vec![])).await;
    assert!(matches!(after, Err(ChainwireError::Network(_))));
}

#[tokio::test]
async fn test_publish_rejects_oversized_payload() {
    let host = loopback_host();
    let too_big = vec![0u8; HostOptions::default().max_message_size + 1];
    assert!(matches!(
        host.publish("/fil/blocks/localnet", too_big).await,
        Err(ChainwireError::Network(_))
    ));
    host.subscribe("/fil/blocks/localnet").await.unwrap();
    host.close().await.unwrap();
}

#[tokio::test]
async fn test_router_on_live_host() {
    let host = loopback_host();
    let router = KadRouter::new(host.command_sender(), RoutingMode::Server, Span::none());
    assert_eq!(router.mode(), RoutingMode::Server);

    let ctx = Context::background().with_timeout(Duration::from_secs(5));
    assert!(router.find_peer(&ctx, PeerId::random()).await.is_err());
    assert!(router.bootstrap().await.is_err());

    router.close().await.unwrap();
    assert!(matches!(
        router.bootstrap().await,
        Err(ChainwireError::Routing(_))
    ));
    host.close().await.unwrap();
}

struct StaticRouter {
    target: PeerAddress,
}

#[async_trait]
impl Closeable for StaticRouter {
    async fn close(&self) -> ChainwireResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Routing for StaticRouter {
    async fn find_peer(&self, _ctx: &Context, peer: PeerId) -> ChainwireResult<PeerAddress> {
        if peer == self.target.peer_id() {
            Ok(self.target.clone())
        } else {
            Err(ChainwireError::Routing(format!("peer {} not found", peer)))
        }
    }

    async fn bootstrap(&self) -> ChainwireResult<()> {
        Ok(())
    }

    fn mode(&self) -> RoutingMode {
        RoutingMode::Auto
    }
}

#[tokio::test]
async fn test_routed_host_resolves_unknown_peer() {
    let a = loopback_host();
    let b = loopback_host();
    let addr = wait_for_listen(&b).await;

    let router = Arc::new(StaticRouter {
        target: PeerAddress::new(b.local_peer_id(), vec![addr]),
    });
    let routed = RoutedHost::new(a.clone(), router);

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    routed
        .connect(&ctx, &PeerAddress::new(b.local_peer_id(), vec![]))
        .await
        .unwrap();
    assert!(routed.is_connected(&b.local_peer_id()));

    let unknown = routed
        .connect(&ctx, &PeerAddress::new(PeerId::random(), vec![]))
        .await;
    assert!(matches!(unknown, Err(ChainwireError::Routing(_))));

    a.close().await.unwrap();
    b.close().await.unwrap();
}

#[tokio::test]
async fn test_explicit_dial_reaches_private_address_under_public_policy() {
    let a = host_with_routing(RoutingConfigurator::for_network(RoutingMode::Server, "localnet"));
    let b = loopback_host();
    let addr = wait_for_listen(&b).await;

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    a.connect(&ctx, &PeerAddress::new(b.local_peer_id(), vec![addr]))
        .await
        .unwrap();
    assert!(PeerConnector::is_connected(&a, &b.local_peer_id()));

    a.close().await.unwrap();
    b.close().await.unwrap();
}

#[tokio::test]
async fn test_transport_bytes_are_metered() {
    let a = loopback_host();
    let b = loopback_host();
    let addr = wait_for_listen(&b).await;
    assert_eq!(a.stats().transport_bytes_out, 0);

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    a.connect(&ctx, &PeerAddress::new(b.local_peer_id(), vec![addr]))
        .await
        .unwrap();

    // Identify and ping run on every new connection.
    let mut stats = a.stats();
    for _ in 0..100 {
        if stats.transport_bytes_in > 0 && stats.transport_bytes_out > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        stats = a.stats();
    }
    assert!(stats.transport_bytes_in > 0);
    assert!(stats.transport_bytes_out > 0);

    a.close().await.unwrap();
    b.close().await.unwrap();
}

#[tokio::test]
async fn test_event_stream_reports_connections() {
    let a = loopback_host();
    let b = loopback_host();
    let addr = wait_for_listen(&b).await;

    let mut events = a.take_event_receiver().unwrap();
    assert!(a.take_event_receiver().is_none());

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    a.connect(&ctx, &PeerAddress::new(b.local_peer_id(), vec![addr.clone()]))
        .await
        .unwrap();

    let connected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Some(NetworkEvent::PeerConnected(peer)) => return peer,
                Some(_) => continue,
                None => panic!("event stream closed early"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(connected, b.local_peer_id());

    let info = a.get_peer(&b.local_peer_id()).unwrap();
    assert_eq!(info.addresses.len(), 1);
    assert!(info.addresses[0].starts_with(&addr.to_string()));
    assert!(!info.protected);
    assert!(a.get_peer(&PeerId::random()).is_none());

    let log = tokio::spawn(log_network_events(a.clone(), events));
    a.close().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), log)
        .await
        .expect("event log outlived the host")
        .unwrap();
    b.close().await.unwrap();
}
