use super::mode::RoutingMode;
use crate::capability::{Closeable, Routing};
use crate::p2p::types::{NetworkCommand, PeerAddress};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::PeerId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, Span};

/// [`Routing`] backed by the Kademlia behaviour running in the host's swarm.
#[derive(Clone)]
pub struct KadRouter {
    command_tx: mpsc::Sender<NetworkCommand>,
    mode: RoutingMode,
    closed: Arc<AtomicBool>,
    span: Span,
}

impl KadRouter {
    pub fn new(command_tx: mpsc::Sender<NetworkCommand>, mode: RoutingMode, span: Span) -> Self {
        Self {
            command_tx,
            mode,
            closed: Arc::new(AtomicBool::new(false)),
            span,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    fn ensure_open(&self) -> ChainwireResult<()> {
        if self.is_closed() {
            return Err(ChainwireError::Routing("router is closed".into()));
        }
        Ok(())
    }

    async fn send(&self, cmd: NetworkCommand) -> ChainwireResult<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| ChainwireError::Routing("host event loop has stopped".into()))
    }
}

#[async_trait]
impl Routing for KadRouter {
    async fn find_peer(&self, ctx: &Context, peer: PeerId) -> ChainwireResult<PeerAddress> {
        self.ensure_open()?;
        ctx.check()?;

        let (reply, rx) = oneshot::channel();
        self.send(NetworkCommand::FindPeer { peer, reply }).await?;

        let addresses = tokio::select! {
            biased;
            _ = ctx.done() => return Err(ctx.err().unwrap_or(ChainwireError::Cancelled)),
            result = rx => result
                .map_err(|_| ChainwireError::Routing("find_peer reply dropped".into()))??,
        };

        self.span
            .in_scope(|| debug!("Resolved {} to {} addresses", peer, addresses.len()));
        Ok(PeerAddress::new(peer, addresses))
    }

    async fn bootstrap(&self) -> ChainwireResult<()> {
        self.ensure_open()?;
        let (reply, rx) = oneshot::channel();
        self.send(NetworkCommand::Bootstrap { reply }).await?;
        rx.await
            .map_err(|_| ChainwireError::Routing("bootstrap reply dropped".into()))?
    }

    fn mode(&self) -> RoutingMode {
        self.mode
    }
}

#[async_trait]
impl Closeable for KadRouter {
    async fn close(&self) -> ChainwireResult<()> {
        if self.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        self.span.in_scope(|| info!("Closing router"));
        // The host may already be gone; its routing state went with it.
        let _ = self.command_tx.send(NetworkCommand::CloseRouting).await;
        Ok(())
    }
}
