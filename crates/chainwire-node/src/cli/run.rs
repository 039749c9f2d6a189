use super::commands::Cli;
use super::utils::{init_logging, print_banner};
use chainwire_node::{
    log_network_events, Context, Network, NetworkAssembler, NodeConfig, NodeStorage, StorageConfig,
};
use chainwire_types::{ChainwireError, ChainwireResult};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const EVENT_LOG_DRAIN: Duration = Duration::from_secs(5);

pub async fn run_node(cli: &Cli, config_path: &Path) -> ChainwireResult<()> {
    let mut config = NodeConfig::load(config_path)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    init_logging(cli, &config.logging)?;
    if !cli.quiet {
        print_banner();
    }
    info!("Starting chainwire v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| ChainwireError::Config(format!("Failed to create data directory: {}", e)))?;

    let storage = NodeStorage::open(StorageConfig::at(config.blocks_path()))?;
    let keypair = storage.load_or_create_keypair()?;

    let ctx = Context::background();
    let network = NetworkAssembler::new(config, keypair, storage.clone(), info_span!("network"))
        .assemble(&ctx)
        .await?;

    if let Err(e) = network.start(&ctx).await {
        shutdown(&network, &ctx).await;
        return Err(e);
    }
    print_ready_message(&network);
    let event_log = spawn_event_log(&network);

    wait_for_shutdown().await;

    info!("Shutting down...");
    shutdown(&network, &ctx).await;
    if let Some(task) = event_log {
        if tokio::time::timeout(EVENT_LOG_DRAIN, task).await.is_err() {
            warn!("Network event log did not drain in time");
        }
    }
    storage.flush()?;

    info!("Shutdown complete");
    Ok(())
}

/// Logs host events until the host closes. `None` for hosts without a
/// transport or whose events were already claimed.
fn spawn_event_log(network: &Network) -> Option<JoinHandle<()>> {
    let host = network.routed_host()?.host().clone();
    let events = host.take_event_receiver()?;
    Some(tokio::spawn(
        log_network_events(host, events).instrument(info_span!("events")),
    ))
}

async fn shutdown(network: &Network, ctx: &Context) {
    let deadline = ctx.with_timeout(SHUTDOWN_TIMEOUT);
    network.stop(&deadline).await;
    ctx.cancel();
}

fn print_ready_message(network: &Network) {
    info!("Network: {}", network.identity());
    info!("Routing mode: {}", network.routing_mode());
    if let Some(routed) = network.routed_host() {
        let host = routed.host();
        info!("Peer ID: {}", host.local_peer_id());
        for addr in host.addresses() {
            info!("Advertising {}", addr);
        }
    }
    if network.is_offline() {
        info!("Offline mode: bootstrap maintenance disabled");
    }
    info!("Press Ctrl+C to stop");
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => { info!("Received SIGTERM"); }
            _ = sigint.recv() => { info!("Received SIGINT"); }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C");
    }
}
