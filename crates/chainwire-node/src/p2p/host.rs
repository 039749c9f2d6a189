use super::builder::{advertised_addresses, HostOptions};
use super::guard::ConnectionGuard;
use super::types::{NetworkCommand, NetworkEvent, NetworkStats, NetworkStatsSnapshot, PeerAddress, PeerInfo};
use crate::capability::{Closeable, PeerConnector, PubSub};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::{Multiaddr, PeerId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Span};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// State the swarm loop publishes for host handles to read.
#[derive(Default)]
pub(crate) struct HostState {
    pub(crate) peers: RwLock<HashMap<PeerId, PeerInfo>>,
    pub(crate) address_book: RwLock<HashMap<PeerId, Vec<Multiaddr>>>,
    pub(crate) listen_addrs: RwLock<Vec<Multiaddr>>,
    pub(crate) stats: NetworkStats,
}

impl HostState {
    pub(crate) fn known_addresses(&self, peer: &PeerId) -> Vec<Multiaddr> {
        self.address_book.read().get(peer).cloned().unwrap_or_default()
    }

    pub(crate) fn remember<'a, I>(&self, peer: PeerId, addrs: I)
    where
        I: IntoIterator<Item = &'a Multiaddr>,
    {
        let mut book = self.address_book.write();
        let entry = book.entry(peer).or_default();
        for addr in addrs {
            if !entry.contains(addr) {
                entry.push(addr.clone());
            }
        }
    }
}

/// Handle to a running transport host. Cheap to clone; every clone drives the
/// same swarm.
#[derive(Clone)]
pub struct Host {
    local_peer_id: PeerId,
    command_tx: mpsc::Sender<NetworkCommand>,
    event_rx: Arc<Mutex<Option<mpsc::Receiver<NetworkEvent>>>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    state: Arc<HostState>,
    guard: Arc<ConnectionGuard>,
    public_address: Option<Multiaddr>,
    max_message_size: usize,
    dial_timeout: Duration,
    closed: Arc<AtomicBool>,
    span: Span,
}

impl Host {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        local_peer_id: PeerId,
        command_tx: mpsc::Sender<NetworkCommand>,
        event_rx: mpsc::Receiver<NetworkEvent>,
        task: JoinHandle<()>,
        state: Arc<HostState>,
        guard: Arc<ConnectionGuard>,
        public_address: Option<Multiaddr>,
        options: &HostOptions,
        span: Span,
    ) -> Self {
        Self {
            local_peer_id,
            command_tx,
            event_rx: Arc::new(Mutex::new(Some(event_rx))),
            task: Arc::new(Mutex::new(Some(task))),
            state,
            guard,
            public_address,
            max_message_size: options.max_message_size,
            dial_timeout: options.dial_timeout,
            closed: Arc::new(AtomicBool::new(false)),
            span,
        }
    }

    pub fn local_peer_id(&self) -> PeerId {
        self.local_peer_id
    }

    pub fn peer_count(&self) -> usize {
        self.state.peers.read().len()
    }

    pub fn peers(&self) -> Vec<PeerInfo> {
        self.state.peers.read().values().cloned().collect()
    }

    pub fn get_peer(&self, peer: &PeerId) -> Option<PeerInfo> {
        self.state.peers.read().get(peer).cloned()
    }

    pub fn known_addresses(&self, peer: &PeerId) -> Vec<Multiaddr> {
        self.state.known_addresses(peer)
    }

    /// Listen addresses plus the configured public address, if any.
    pub fn addresses(&self) -> Vec<Multiaddr> {
        advertised_addresses(&self.state.listen_addrs.read(), self.public_address.as_ref())
    }

    pub fn stats(&self) -> NetworkStatsSnapshot {
        self.state.stats.snapshot()
    }

    pub fn guard(&self) -> &Arc<ConnectionGuard> {
        &self.guard
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Takes the network event stream. Only the first caller receives it.
    pub fn take_event_receiver(&self) -> Option<mpsc::Receiver<NetworkEvent>> {
        self.event_rx.lock().take()
    }

    pub(crate) fn command_sender(&self) -> mpsc::Sender<NetworkCommand> {
        self.command_tx.clone()
    }

    async fn send(&self, cmd: NetworkCommand) -> ChainwireResult<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| ChainwireError::Network("host event loop has stopped".into()))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<ChainwireResult<T>>) -> NetworkCommand,
    ) -> ChainwireResult<T> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await
            .map_err(|_| ChainwireError::Network("host dropped the request".into()))?
    }

    pub async fn disconnect(&self, peer: PeerId) -> ChainwireResult<()> {
        self.send(NetworkCommand::Disconnect(peer)).await
    }

    pub async fn add_address(&self, peer: PeerId, addr: Multiaddr) -> ChainwireResult<()> {
        self.send(NetworkCommand::AddAddress(peer, addr)).await
    }

    /// Dials `peer` at the given addresses, or at whatever the swarm already
    /// knows when none are given. Bounded by the dial timeout and by `ctx`.
    pub async fn connect(&self, ctx: &Context, peer: &PeerAddress) -> ChainwireResult<()> {
        ctx.check()?;
        let dial = self.request(|reply| NetworkCommand::Dial {
            peer: peer.peer_id(),
            addresses: peer.addresses().to_vec(),
            reply,
        });

        tokio::select! {
            biased;
            _ = ctx.done() => Err(ctx.err().unwrap_or(ChainwireError::Cancelled)),
            result = tokio::time::timeout(self.dial_timeout, dial) => match result {
                Ok(result) => result,
                Err(_) => Err(ChainwireError::Network(format!(
                    "Dial to {} timed out after {:?}",
                    peer.peer_id(),
                    self.dial_timeout
                ))),
            },
        }
    }
}

#[async_trait]
impl PubSub for Host {
    async fn publish(&self, topic: &str, data: Vec<u8>) -> ChainwireResult<()> {
        if data.len() > self.max_message_size {
            return Err(ChainwireError::Network(format!(
                "Message too large: {} bytes (max: {})",
                data.len(),
                self.max_message_size
            )));
        }
        let topic = topic.to_string();
        self.request(|reply| NetworkCommand::Publish { topic, data, reply }).await
    }

    async fn subscribe(&self, topic: &str) -> ChainwireResult<()> {
        let topic = topic.to_string();
        self.request(|reply| NetworkCommand::Subscribe { topic, reply }).await
    }

    async fn unsubscribe(&self, topic: &str) -> ChainwireResult<()> {
        let topic = topic.to_string();
        self.request(|reply| NetworkCommand::Unsubscribe { topic, reply }).await
    }
}

#[async_trait]
impl PeerConnector for Host {
    fn connected_peers(&self) -> usize {
        self.peer_count()
    }

    fn is_connected(&self, peer: &PeerId) -> bool {
        self.state.peers.read().contains_key(peer)
    }

    async fn connect(&self, ctx: &Context, peer: &PeerAddress) -> ChainwireResult<()> {
        Host::connect(self, ctx, peer).await
    }
}

#[async_trait]
impl Closeable for Host {
    async fn close(&self) -> ChainwireResult<()> {
        if self.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }

        self.span.in_scope(|| info!("Shutting down host {}", self.local_peer_id));
        if self.command_tx.send(NetworkCommand::Shutdown).await.is_err() {
            self.span.in_scope(|| debug!("Swarm loop already stopped"));
        }

        let task = self.task.lock().take();
        if let Some(mut task) = task {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(ChainwireError::Network(format!("Swarm task failed: {}", e)));
                }
                Err(_) => {
                    self.span
                        .in_scope(|| warn!("Swarm loop did not stop within {:?}, aborting", SHUTDOWN_TIMEOUT));
                    task.abort();
                }
            }
        }

        self.state.peers.write().clear();
        Ok(())
    }
}
