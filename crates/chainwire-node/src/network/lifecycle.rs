use super::Network;
use crate::supervisor::{BackgroundTask, Context};
use chainwire_types::ChainwireResult;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{info, warn};

const PEER_MANAGER_STOP_TIMEOUT: Duration = Duration::from_secs(10);

impl Network {
    /// Launches the peer manager (unless offline) and registers the exchange
    /// server and hello handlers. Calls after the first are no-ops.
    pub async fn start(&self, ctx: &Context) -> ChainwireResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(parent: &self.span, "Starting network {}", self.identity);

        if self.offline {
            info!(parent: &self.span, "Offline mode, peer manager not started");
        } else {
            let peer_manager = self.peer_manager.clone();
            let task = BackgroundTask::spawn("peer-manager", ctx, move |ctx| async move {
                peer_manager.run(ctx).await
            });
            *self.peer_task.lock() = Some(task);
        }

        self.exchange_server.register().await?;
        self.hello.register().await?;
        Ok(())
    }

    /// Best-effort teardown: peer manager, exchange, host, then router. Each
    /// failure is logged and the remaining steps still run. The peer manager
    /// wait is bounded by `ctx`'s deadline when it has one.
    pub async fn stop(&self, ctx: &Context) {
        info!(parent: &self.span, "Stopping network");

        let task = self.peer_task.lock().take();
        if let Some(task) = task {
            let timeout = ctx
                .deadline()
                .map(|d| d.saturating_duration_since(tokio::time::Instant::now()))
                .unwrap_or(PEER_MANAGER_STOP_TIMEOUT);
            if let Err(e) = task.stop(timeout).await {
                warn!(parent: &self.span, "Error stopping peer manager: {}", e);
            }
        }

        if let Err(e) = self.exchange.close().await {
            warn!(parent: &self.span, "Error closing exchange: {}", e);
        }
        if let Err(e) = self.host.close().await {
            warn!(parent: &self.span, "Error closing host: {}", e);
        }
        if let Err(e) = self.router.close().await {
            warn!(parent: &self.span, "Error closing router: {}", e);
        }

        info!(parent: &self.span, "Network stopped");
    }
}
