use super::types::{BackoffStrategy, PeerAddress};
use crate::capability::{PeerConnector, PeerManager, Routing};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::ChainwireResult;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument, Span};

const MAX_BOOTSTRAP_BACKOFF: Duration = Duration::from_secs(600);

/// Keeps the node connected: whenever the live peer count drops below the
/// minimum it redials bootstrap peers and re-seeds the routing table.
pub struct BootstrapPeerManager {
    connector: Arc<dyn PeerConnector>,
    router: Arc<dyn Routing>,
    bootstrap_peers: Vec<PeerAddress>,
    period: Duration,
    min_peers: usize,
    backoff: Mutex<BackoffStrategy>,
    retry_at: Mutex<Option<Instant>>,
    span: Span,
}

impl BootstrapPeerManager {
    pub fn new(
        connector: Arc<dyn PeerConnector>,
        router: Arc<dyn Routing>,
        bootstrap_peers: Vec<PeerAddress>,
        period: Duration,
        min_peers: usize,
        span: Span,
    ) -> Self {
        let period = period.max(Duration::from_secs(1));
        Self {
            connector,
            router,
            bootstrap_peers,
            period,
            min_peers,
            backoff: Mutex::new(BackoffStrategy::exponential(period, MAX_BOOTSTRAP_BACKOFF)),
            retry_at: Mutex::new(None),
            span,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn min_peers(&self) -> usize {
        self.min_peers
    }

    pub(crate) async fn tick(&self, ctx: &Context) {
        let live = self.connector.connected_peers();
        if live >= self.min_peers {
            debug!("Peer count {} satisfies minimum {}", live, self.min_peers);
            return;
        }

        info!(
            "Peer count {} below minimum {}, reconnecting to bootstrap peers",
            live, self.min_peers
        );

        let dials = self
            .bootstrap_peers
            .iter()
            .filter(|peer| !self.connector.is_connected(&peer.peer_id()))
            .map(|peer| async move {
                if let Err(e) = self.connector.connect(ctx, peer).await {
                    warn!("Failed to reach bootstrap peer {}: {}", peer.peer_id(), e);
                }
            });
        join_all(dials).await;

        if ctx.is_done() {
            return;
        }
        self.bootstrap_routing().await;
    }

    async fn bootstrap_routing(&self) {
        let retry_at = *self.retry_at.lock();
        if let Some(at) = retry_at {
            if Instant::now() < at {
                debug!("Routing bootstrap backing off until {:?}", at);
                return;
            }
        }

        match self.router.bootstrap().await {
            Ok(()) => {
                self.backoff.lock().reset();
                *self.retry_at.lock() = None;
            }
            Err(e) => {
                let delay = self.backoff.lock().next_delay().unwrap_or(MAX_BOOTSTRAP_BACKOFF);
                warn!("Routing bootstrap failed: {}. Retrying in {:?}", e, delay);
                *self.retry_at.lock() = Some(Instant::now() + delay);
            }
        }
    }
}

#[async_trait]
impl PeerManager for BootstrapPeerManager {
    async fn run(&self, ctx: Context) -> ChainwireResult<()> {
        let span = self.span.clone();
        async move {
            info!(
                "Peer manager started ({} bootstrap peers, every {:?})",
                self.bootstrap_peers.len(),
                self.period
            );

            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = ctx.done() => break,
                    _ = ticker.tick() => self.tick(&ctx).await,
                }
            }

            info!("Peer manager stopped");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
