use super::{Network, NetworkNameResolver, NetworkParts, TransferRetry};
use crate::capability::{
    BlockExchange, BlockSource, ExchangeServer, HelloProtocol, ObjectStore, PeerConnector,
};
use crate::config::NodeConfig;
use crate::exchange::OfflineExchange;
use crate::p2p::{
    parse_bootstrap_addresses, BootstrapPeerManager, ConnectionGuard, ConnectionWatermarks,
    HelloService, HostBuilder, HostOptions, KadRouter, RoutedHost, RoutingConfigurator,
    RoutingMode,
};
use crate::storage::NodeStorage;
use crate::supervisor::Context;
use chainwire_types::{ChainwireResult, NetworkIdentity, MAINNET_NETWORK_NAME};
use libp2p::identity::Keypair;
use std::sync::Arc;
use tracing::{info, info_span, Span};

/// Builds a [`Network`] from configuration in dependency order: identity,
/// connection guard, routing policy, host, router, routed host, peer manager.
pub struct NetworkAssembler {
    config: NodeConfig,
    keypair: Keypair,
    store: Arc<dyn ObjectStore>,
    local_blocks: Arc<dyn BlockSource>,
    exchange: Option<(Arc<dyn BlockExchange>, Arc<dyn ExchangeServer>)>,
    hello: Option<Arc<dyn HelloProtocol>>,
    span: Span,
}

impl NetworkAssembler {
    pub fn new(config: NodeConfig, keypair: Keypair, storage: NodeStorage, span: Span) -> Self {
        let storage = Arc::new(storage);
        Self {
            config,
            keypair,
            store: storage.clone(),
            local_blocks: storage,
            exchange: None,
            hello: None,
            span,
        }
    }

    /// Resolves genesis state from `store` instead of node storage.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = store;
        self
    }

    /// Replaces the default offline exchange.
    pub fn with_exchange(
        mut self,
        exchange: Arc<dyn BlockExchange>,
        server: Arc<dyn ExchangeServer>,
    ) -> Self {
        self.exchange = Some((exchange, server));
        self
    }

    pub fn with_hello(mut self, hello: Arc<dyn HelloProtocol>) -> Self {
        self.hello = Some(hello);
        self
    }

    pub async fn assemble(self, ctx: &Context) -> ChainwireResult<Network> {
        let span = self.span;
        let config = self.config;

        let genesis = config.genesis_id()?;
        let name = if config.network.devnet {
            NetworkNameResolver::new(info_span!(parent: &span, "resolver"))
                .resolve(ctx, &genesis, self.store.as_ref())
                .await?
        } else {
            MAINNET_NETWORK_NAME.to_string()
        };
        let identity = NetworkIdentity { name, genesis };

        let bootstrap = parse_bootstrap_addresses(&config.bootstrap.addresses)?;
        let watermarks = ConnectionWatermarks::parse(
            config.swarm.conn_mgr_low,
            config.swarm.conn_mgr_high,
            &config.swarm.conn_mgr_grace,
        )?;
        let guard = Arc::new(ConnectionGuard::new(
            watermarks,
            &config.swarm.protected_peers,
            &bootstrap,
            info_span!(parent: &span, "guard"),
        )?);
        let routing = RoutingConfigurator::for_network(
            RoutingMode::for_node(config.pubsub.bootstrapper),
            &identity.name,
        );
        let options = HostOptions::from_config(&config.swarm)?;
        let period = config.bootstrap_period()?;
        let transfer_retry = TransferRetry::from_config(&config.transfer)?;

        // Everything fallible is settled; from here on the host is live.
        let host = HostBuilder::new(options, info_span!(parent: &span, "host")).build(
            self.keypair,
            &routing,
            guard,
            &bootstrap,
        )?;

        let router = Arc::new(KadRouter::new(
            host.command_sender(),
            routing.mode(),
            info_span!(parent: &span, "router"),
        ));
        let routed = RoutedHost::new(host.clone(), router.clone());

        let connector: Arc<dyn PeerConnector> = Arc::new(routed.clone());
        let peer_manager = Arc::new(BootstrapPeerManager::new(
            connector,
            router.clone(),
            bootstrap,
            period,
            config.bootstrap.min_peers as usize,
            info_span!(parent: &span, "peermgr"),
        ));

        let (exchange, exchange_server) = match self.exchange {
            Some(pair) => pair,
            None => {
                let offline = Arc::new(OfflineExchange::new(self.local_blocks));
                let exchange: Arc<dyn BlockExchange> = offline.clone();
                let server: Arc<dyn ExchangeServer> = offline;
                (exchange, server)
            }
        };

        let pubsub = Arc::new(host.clone());
        let hello: Arc<dyn HelloProtocol> = match self.hello {
            Some(hello) => hello,
            None => Arc::new(HelloService::new(pubsub.clone(), identity.clone())),
        };

        info!(
            parent: &span,
            "Assembled network {} (peer {}, routing {})",
            identity,
            host.local_peer_id(),
            routing.mode()
        );

        Ok(Network::from_parts(
            NetworkParts {
                identity,
                offline: config.offline,
                host: Arc::new(host),
                pubsub,
                router,
                exchange,
                exchange_server,
                hello,
                peer_manager,
                transfer_retry,
                routed_host: Some(routed),
            },
            span,
        ))
    }
}
