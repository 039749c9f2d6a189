use super::behaviour::NodeBehaviour;
use super::guard::ConnectionGuard;
use super::host::{Host, HostState};
use super::types::NetworkStats;
use super::routing::{PublicDialGate, RoutingConfigurator};
use super::swarm::SwarmLoop;
use super::types::PeerAddress;
use super::{agent_version, IDENTIFY_PROTOCOL};
use crate::config::SwarmConfig;
use chainwire_types::{ChainwireError, ChainwireResult};
#[allow(deprecated)]
use libp2p::bandwidth::BandwidthSinks;
use libp2p::identity::Keypair;
use libp2p::multiaddr::Protocol;
use libp2p::swarm::behaviour::toggle::Toggle;
use libp2p::{
    autonat, gossipsub, identify, kad, noise, ping, relay, tcp, yamux, Multiaddr, Swarm,
    SwarmBuilder,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn, Instrument, Span};

const COMMAND_CHANNEL_SIZE: usize = 256;
const EVENT_CHANNEL_SIZE: usize = 1024;

type BehaviourResult = Result<NodeBehaviour, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Debug)]
pub struct HostOptions {
    pub listen_addresses: Vec<Multiaddr>,
    pub relay: bool,
    /// Address advertised in addition to discovered ones. Empty means no
    /// override.
    pub public_relay_address: String,
    pub static_relays: Vec<Multiaddr>,
    pub idle_timeout: Duration,
    pub dial_timeout: Duration,
    pub max_message_size: usize,
}

impl HostOptions {
    pub fn from_config(config: &SwarmConfig) -> ChainwireResult<Self> {
        Ok(Self {
            listen_addresses: super::helpers::parse_multiaddrs(&config.listen_addresses)?,
            relay: config.relay,
            public_relay_address: config.public_relay_address.clone(),
            static_relays: super::helpers::parse_multiaddrs(&config.static_relays)?,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            dial_timeout: Duration::from_secs(config.dial_timeout_secs),
            max_message_size: config.max_message_size,
        })
    }
}

impl Default for HostOptions {
    fn default() -> Self {
        Self::from_config(&SwarmConfig::default()).unwrap_or_else(|_| Self {
            listen_addresses: Vec::new(),
            relay: false,
            public_relay_address: String::new(),
            static_relays: Vec::new(),
            idle_timeout: Duration::from_secs(60),
            dial_timeout: Duration::from_secs(10),
            max_message_size: 1 << 20,
        })
    }
}

/// Appends `public` to the discovered address set when it is present and not
/// already listed. Discovered addresses are never altered.
pub fn advertised_addresses(discovered: &[Multiaddr], public: Option<&Multiaddr>) -> Vec<Multiaddr> {
    let mut addrs = discovered.to_vec();
    if let Some(public) = public {
        if !addrs.contains(public) {
            addrs.push(public.clone());
        }
    }
    addrs
}

/// Constructs the transport host, with or without relay support.
pub struct HostBuilder {
    options: HostOptions,
    span: Span,
}

impl HostBuilder {
    pub fn new(options: HostOptions, span: Span) -> Self {
        Self { options, span }
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    /// The public address override. Only meaningful with relay enabled; an
    /// empty string yields `None`.
    pub fn public_address(&self) -> ChainwireResult<Option<Multiaddr>> {
        if !self.options.relay || self.options.public_relay_address.is_empty() {
            return Ok(None);
        }
        self.options
            .public_relay_address
            .parse::<Multiaddr>()
            .map(Some)
            .map_err(|e| {
                ChainwireError::InvalidAddress(format!(
                    "{}: {}",
                    self.options.public_relay_address, e
                ))
            })
    }

    /// Builds the swarm, starts listening and spawns its event loop. The
    /// returned host owns the loop; the caller must close it.
    pub fn build(
        self,
        keypair: Keypair,
        routing: &RoutingConfigurator,
        guard: Arc<ConnectionGuard>,
        bootstrap_peers: &[PeerAddress],
    ) -> ChainwireResult<Host> {
        let public_address = self.public_address()?;
        let local_peer_id = keypair.public().to_peer_id();
        let kademlia = routing.configure(local_peer_id)?;
        let policy = routing.policy();

        let (mut swarm, transport_meter) =
            self.build_swarm(keypair, kademlia, routing.dial_gate())?;

        for addr in &self.options.listen_addresses {
            swarm
                .listen_on(addr.clone())
                .map_err(|e| ChainwireError::Network(format!("Failed to listen on {}: {}", addr, e)))?;
        }

        if self.options.relay {
            for relay_addr in &self.options.static_relays {
                let circuit = relay_addr.clone().with(Protocol::P2pCircuit);
                if let Err(e) = swarm.listen_on(circuit.clone()) {
                    warn!("Failed to reserve relay slot via {}: {}", circuit, e);
                }
            }
        }

        if let Some(public) = &public_address {
            swarm.add_external_address(public.clone());
        }

        for peer in bootstrap_peers {
            swarm.behaviour_mut().dial_gate.allow(peer.peer_id());
            for addr in policy.admissible(peer.addresses()) {
                swarm.behaviour_mut().kademlia.add_address(&peer.peer_id(), addr);
            }
        }

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let state = Arc::new(HostState {
            stats: NetworkStats::with_transport(transport_meter),
            ..Default::default()
        });

        let event_loop = SwarmLoop::new(
            swarm,
            command_rx,
            event_tx,
            state.clone(),
            guard.clone(),
            policy,
            self.options.max_message_size,
        );
        let task = tokio::spawn(event_loop.run().instrument(self.span.clone()));

        self.span.in_scope(|| {
            info!(
                "Host {} started (relay: {}, routing: {})",
                local_peer_id, self.options.relay, policy.mode
            )
        });

        Ok(Host::new(
            local_peer_id,
            command_tx,
            event_rx,
            task,
            state,
            guard,
            public_address,
            &self.options,
            self.span,
        ))
    }

    /// Builds the swarm with a byte meter on every transport substream.
    #[allow(deprecated)]
    fn build_swarm(
        &self,
        keypair: Keypair,
        kademlia: kad::Behaviour<kad::store::MemoryStore>,
        dial_gate: PublicDialGate,
    ) -> ChainwireResult<(Swarm<NodeBehaviour>, Arc<BandwidthSinks>)> {
        let max_message_size = self.options.max_message_size;
        let idle_timeout = self.options.idle_timeout;

        if self.options.relay {
            let (builder, meter) = SwarmBuilder::with_existing_identity(keypair)
                .with_tokio()
                .with_tcp(tcp::Config::default(), noise::Config::new, yamux::Config::default)
                .map_err(transport_error)?
                .with_dns()
                .map_err(transport_error)?
                .with_relay_client(noise::Config::new, yamux::Config::default)
                .map_err(transport_error)?
                .with_bandwidth_logging();
            let swarm = builder
                .with_behaviour(|key, relay_client| {
                    node_behaviour(key, kademlia, dial_gate, Some(relay_client), max_message_size)
                })
                .map_err(behaviour_error)?
                .with_swarm_config(|c| c.with_idle_connection_timeout(idle_timeout))
                .build();
            Ok((swarm, meter))
        } else {
            let (builder, meter) = SwarmBuilder::with_existing_identity(keypair)
                .with_tokio()
                .with_tcp(tcp::Config::default(), noise::Config::new, yamux::Config::default)
                .map_err(transport_error)?
                .with_dns()
                .map_err(transport_error)?
                .with_bandwidth_logging();
            let swarm = builder
                .with_behaviour(|key| node_behaviour(key, kademlia, dial_gate, None, max_message_size))
                .map_err(behaviour_error)?
                .with_swarm_config(|c| c.with_idle_connection_timeout(idle_timeout))
                .build();
            Ok((swarm, meter))
        }
    }
}

fn node_behaviour(
    key: &Keypair,
    kademlia: kad::Behaviour<kad::store::MemoryStore>,
    dial_gate: PublicDialGate,
    relay_client: Option<relay::client::Behaviour>,
    max_message_size: usize,
) -> BehaviourResult {
    let gossipsub_config = gossipsub::ConfigBuilder::default()
        .heartbeat_interval(Duration::from_secs(1))
        .validation_mode(gossipsub::ValidationMode::Strict)
        .max_transmit_size(max_message_size)
        .message_id_fn(|msg| {
            let hash = blake3::hash(&msg.data);
            gossipsub::MessageId::from(hash.as_bytes().to_vec())
        })
        .build()
        .map_err(|e| format!("Invalid gossipsub config: {:?}", e))?;

    let gossipsub = gossipsub::Behaviour::new(
        gossipsub::MessageAuthenticity::Signed(key.clone()),
        gossipsub_config,
    )?;

    let identify = identify::Behaviour::new(
        identify::Config::new(IDENTIFY_PROTOCOL.to_string(), key.public())
            .with_agent_version(agent_version()),
    );

    // NAT reachability probing only matters when relaying is possible.
    let autonat = relay_client
        .as_ref()
        .map(|_| autonat::Behaviour::new(key.public().to_peer_id(), autonat::Config::default()));

    Ok(NodeBehaviour {
        kademlia,
        gossipsub,
        identify,
        ping: ping::Behaviour::new(ping::Config::new()),
        relay_client: Toggle::from(relay_client),
        autonat: Toggle::from(autonat),
        dial_gate,
    })
}

fn transport_error(e: impl std::fmt::Display) -> ChainwireError {
    ChainwireError::Network(format!("Failed to create transport: {}", e))
}

fn behaviour_error(e: impl std::fmt::Display) -> ChainwireError {
    ChainwireError::Network(format!("Failed to create behaviour: {}", e))
}
