use super::behaviour::{NodeBehaviour, NodeBehaviourEvent};
use super::guard::ConnectionGuard;
use super::host::HostState;
use super::routing::RoutingPolicy;
use super::types::{NetworkCommand, NetworkEvent, PeerInfo, Reply};
use chainwire_types::ChainwireError;
use futures::StreamExt;
use libp2p::swarm::dial_opts::DialOpts;
use libp2p::{
    autonat, gossipsub, identify, kad, ping,
    swarm::SwarmEvent,
    Multiaddr, PeerId, Swarm,
};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Owns the swarm and serializes every operation on it. Host handles talk to
/// it through [`NetworkCommand`]s.
pub(crate) struct SwarmLoop {
    swarm: Swarm<NodeBehaviour>,
    command_rx: mpsc::Receiver<NetworkCommand>,
    event_tx: mpsc::Sender<NetworkEvent>,
    state: Arc<HostState>,
    guard: Arc<ConnectionGuard>,
    policy: RoutingPolicy,
    max_message_size: usize,
    pending_dials: HashMap<PeerId, Vec<Reply<()>>>,
    pending_lookups: HashMap<kad::QueryId, (PeerId, Reply<Vec<Multiaddr>>)>,
    routing_closed: bool,
}

impl SwarmLoop {
    pub(crate) fn new(
        swarm: Swarm<NodeBehaviour>,
        command_rx: mpsc::Receiver<NetworkCommand>,
        event_tx: mpsc::Sender<NetworkEvent>,
        state: Arc<HostState>,
        guard: Arc<ConnectionGuard>,
        policy: RoutingPolicy,
        max_message_size: usize,
    ) -> Self {
        Self {
            swarm,
            command_rx,
            event_tx,
            state,
            guard,
            policy,
            max_message_size,
            pending_dials: HashMap::new(),
            pending_lookups: HashMap::new(),
            routing_closed: false,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.guard.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(NetworkCommand::Shutdown) | None => {
                        info!("Received shutdown command");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                },

                event = self.swarm.select_next_some() => self.handle_swarm_event(event),

                _ = sweep.tick() => self.trim_connections(),
            }
        }

        self.fail_pending("host is shutting down");
        info!("P2P swarm loop ended");
    }

    fn handle_command(&mut self, cmd: NetworkCommand) {
        match cmd {
            NetworkCommand::Dial { peer, addresses, reply } => {
                if self.swarm.is_connected(&peer) {
                    let _ = reply.send(Ok(()));
                    return;
                }

                self.state.stats.connection_attempts.fetch_add(1, Ordering::Relaxed);
                // Explicit dials may target private addresses; routing queries may not.
                self.swarm.behaviour_mut().dial_gate.allow(peer);
                let opts = DialOpts::peer_id(peer).addresses(addresses).build();

                match self.swarm.dial(opts) {
                    Ok(()) => self.pending_dials.entry(peer).or_default().push(reply),
                    Err(e) => {
                        warn!("Failed to dial {}: {}", peer, e);
                        self.state.stats.connection_failures.fetch_add(1, Ordering::Relaxed);
                        let _ = reply.send(Err(ChainwireError::Network(format!(
                            "Failed to dial {}: {}",
                            peer, e
                        ))));
                    }
                }
            }

            NetworkCommand::Disconnect(peer) => {
                let _ = self.swarm.disconnect_peer_id(peer);
            }

            NetworkCommand::Publish { topic, data, reply } => {
                if data.len() > self.max_message_size {
                    let _ = reply.send(Err(ChainwireError::Network(format!(
                        "Message too large: {} bytes (max: {})",
                        data.len(),
                        self.max_message_size
                    ))));
                    return;
                }

                let len = data.len() as u64;
                let result = self
                    .swarm
                    .behaviour_mut()
                    .gossipsub
                    .publish(gossipsub::IdentTopic::new(&topic), data)
                    .map(|_| {
                        self.state.stats.messages_published.fetch_add(1, Ordering::Relaxed);
                        self.state.stats.bytes_sent.fetch_add(len, Ordering::Relaxed);
                    })
                    .map_err(|e| {
                        ChainwireError::Network(format!("Failed to publish to {}: {:?}", topic, e))
                    });
                let _ = reply.send(result);
            }

            NetworkCommand::Subscribe { topic, reply } => {
                let result = self
                    .swarm
                    .behaviour_mut()
                    .gossipsub
                    .subscribe(&gossipsub::IdentTopic::new(&topic))
                    .map(|_| debug!("Subscribed to topic: {}", topic))
                    .map_err(|e| {
                        ChainwireError::Network(format!("Failed to subscribe to {}: {:?}", topic, e))
                    });
                let _ = reply.send(result);
            }

            NetworkCommand::Unsubscribe { topic, reply } => {
                let result = self
                    .swarm
                    .behaviour_mut()
                    .gossipsub
                    .unsubscribe(&gossipsub::IdentTopic::new(&topic))
                    .map(|_| ())
                    .map_err(|e| {
                        ChainwireError::Network(format!(
                            "Failed to unsubscribe from {}: {:?}",
                            topic, e
                        ))
                    });
                let _ = reply.send(result);
            }

            NetworkCommand::AddAddress(peer, addr) => self.admit(peer, addr),

            NetworkCommand::Bootstrap { reply } => {
                if self.routing_closed {
                    let _ = reply.send(Err(ChainwireError::Routing("router is closed".into())));
                    return;
                }
                let result = self
                    .swarm
                    .behaviour_mut()
                    .kademlia
                    .bootstrap()
                    .map(|_| debug!("Bootstrap initiated"))
                    .map_err(|_| ChainwireError::Routing("no known peers to bootstrap from".into()));
                let _ = reply.send(result);
            }

            NetworkCommand::FindPeer { peer, reply } => {
                if self.routing_closed {
                    let _ = reply.send(Err(ChainwireError::Routing("router is closed".into())));
                    return;
                }
                let known = self.state.known_addresses(&peer);
                if !known.is_empty() {
                    let _ = reply.send(Ok(known));
                    return;
                }
                let query = self.swarm.behaviour_mut().kademlia.get_closest_peers(peer);
                self.pending_lookups.insert(query, (peer, reply));
            }

            NetworkCommand::CloseRouting => {
                info!("Routing closed");
                self.routing_closed = true;
                for (_, (_, reply)) in self.pending_lookups.drain() {
                    let _ = reply.send(Err(ChainwireError::Routing("router is closed".into())));
                }
            }

            NetworkCommand::Shutdown => {}
        }
    }

    fn handle_swarm_event(&mut self, event: SwarmEvent<NodeBehaviourEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                info!("Listening on {}", address);
                self.state.listen_addrs.write().push(address);
            }

            SwarmEvent::ExpiredListenAddr { address, .. } => {
                debug!("Listen address expired: {}", address);
                self.state.listen_addrs.write().retain(|a| a != &address);
            }

            SwarmEvent::ConnectionEstablished { peer_id, endpoint, num_established, .. } => {
                let remote = endpoint.get_remote_address().clone();
                if endpoint.is_dialer() {
                    self.state.remember(peer_id, std::iter::once(&remote));
                }

                self.guard.on_connected(peer_id, Instant::now());
                if num_established.get() == 1 {
                    info!("Connected to peer: {}", peer_id);

                    let mut info = PeerInfo::new(peer_id, vec![remote.to_string()]);
                    info.protected = self.guard.is_protected(&peer_id);
                    self.state.peers.write().insert(peer_id, info);
                    self.state.stats.peer_count.fetch_add(1, Ordering::Relaxed);
                    self.emit(NetworkEvent::PeerConnected(peer_id));
                }

                for reply in self.pending_dials.remove(&peer_id).unwrap_or_default() {
                    let _ = reply.send(Ok(()));
                }
            }

            SwarmEvent::ConnectionClosed { peer_id, num_established, cause, .. } => {
                self.guard.on_disconnected(&peer_id);
                if num_established == 0 {
                    info!("Disconnected from peer: {} (cause: {:?})", peer_id, cause);
                    self.state.peers.write().remove(&peer_id);
                    self.state.stats.peer_count.fetch_sub(1, Ordering::Relaxed);
                    self.emit(NetworkEvent::PeerDisconnected(peer_id));
                }
            }

            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                self.state.stats.connection_failures.fetch_add(1, Ordering::Relaxed);
                match peer_id {
                    Some(peer) => {
                        warn!("Failed to connect to {}: {}", peer, error);
                        // Another connection attempt may still be in flight.
                        if self.swarm.is_connected(&peer) {
                            return;
                        }
                        for reply in self.pending_dials.remove(&peer).unwrap_or_default() {
                            let _ = reply.send(Err(ChainwireError::Network(format!(
                                "Failed to connect to {}: {}",
                                peer, error
                            ))));
                        }
                    }
                    None => warn!("Outgoing connection failed: {}", error),
                }
            }

            SwarmEvent::IncomingConnectionError { local_addr, send_back_addr, error, .. } => {
                debug!(
                    "Incoming connection error from {} to {}: {}",
                    send_back_addr, local_addr, error
                );
            }

            SwarmEvent::Behaviour(NodeBehaviourEvent::Gossipsub(event)) => self.on_gossipsub(event),
            SwarmEvent::Behaviour(NodeBehaviourEvent::Kademlia(event)) => self.on_kademlia(event),
            SwarmEvent::Behaviour(NodeBehaviourEvent::Identify(event)) => self.on_identify(event),

            SwarmEvent::Behaviour(NodeBehaviourEvent::Ping(ping::Event { peer, result, .. })) => {
                match result {
                    Ok(rtt) => {
                        debug!("Ping to {} took {:?}", peer, rtt);
                        if let Some(info) = self.state.peers.write().get_mut(&peer) {
                            info.latency_ms = Some(rtt.as_millis() as u32);
                        }
                        self.emit(NetworkEvent::PingResult { peer, rtt });
                    }
                    Err(e) => debug!("Ping to {} failed: {:?}", peer, e),
                }
            }

            SwarmEvent::Behaviour(NodeBehaviourEvent::Relay(event)) => {
                debug!("Relay client event: {:?}", event);
            }

            SwarmEvent::Behaviour(NodeBehaviourEvent::Autonat(autonat::Event::StatusChanged {
                old,
                new,
            })) => {
                info!("NAT status changed: {:?} -> {:?}", old, new);
            }

            _ => {}
        }
    }

    fn on_gossipsub(&mut self, event: gossipsub::Event) {
        match event {
            gossipsub::Event::Message { propagation_source, message, message_id } => {
                let topic = message.topic.to_string();
                debug!(
                    "Received message {} on topic {} from {}",
                    message_id, topic, propagation_source
                );

                self.state.stats.messages_received.fetch_add(1, Ordering::Relaxed);
                self.state
                    .stats
                    .bytes_received
                    .fetch_add(message.data.len() as u64, Ordering::Relaxed);

                self.emit(NetworkEvent::Message {
                    topic,
                    source: propagation_source,
                    data: message.data,
                });
            }
            gossipsub::Event::Subscribed { peer_id, topic } => {
                debug!("Peer {} subscribed to {}", peer_id, topic);
            }
            gossipsub::Event::Unsubscribed { peer_id, topic } => {
                debug!("Peer {} unsubscribed from {}", peer_id, topic);
            }
            _ => {}
        }
    }

    fn on_kademlia(&mut self, event: kad::Event) {
        match event {
            kad::Event::RoutablePeer { peer, address }
            | kad::Event::PendingRoutablePeer { peer, address } => self.admit(peer, address),

            kad::Event::RoutingUpdated { peer, addresses, is_new_peer, .. } => {
                debug!("Routing table updated for peer: {} (new: {})", peer, is_new_peer);
                let addrs: Vec<Multiaddr> = addresses.iter().cloned().collect();
                self.state.remember(peer, addrs.iter());
                self.emit(NetworkEvent::PeerDiscovered(peer, addrs));
            }

            kad::Event::ModeChanged { new_mode } => match self.policy.mode.correction(new_mode) {
                Some(pinned) => {
                    warn!(
                        "Routing mode drifted to {}, restoring {}",
                        new_mode, self.policy.mode
                    );
                    self.swarm.behaviour_mut().kademlia.set_mode(Some(pinned));
                }
                None => info!("Routing mode is now {}", new_mode),
            },

            kad::Event::OutboundQueryProgressed { id, result, step, .. } => match result {
                kad::QueryResult::Bootstrap(Ok(kad::BootstrapOk { peer, num_remaining })) => {
                    debug!("Bootstrap progress: peer={}, remaining={}", peer, num_remaining);
                }
                kad::QueryResult::Bootstrap(Err(e)) => {
                    warn!("Bootstrap failed: {:?}", e);
                }
                kad::QueryResult::GetClosestPeers(_) => self.progress_lookup(id, step.last),
                _ => {}
            },

            _ => {}
        }
    }

    fn on_identify(&mut self, event: identify::Event) {
        if let identify::Event::Received { peer_id, info, .. } = event {
            debug!(
                "Identified peer {}: {} ({})",
                peer_id, info.agent_version, info.protocol_version
            );

            if let Some(peer_info) = self.state.peers.write().get_mut(&peer_id) {
                peer_info.protocol_version = Some(info.protocol_version.clone());
                peer_info.agent_version = Some(info.agent_version.clone());
                peer_info.addresses = info.listen_addrs.iter().map(|a| a.to_string()).collect();
            }

            for addr in info.listen_addrs {
                self.admit(peer_id, addr);
            }
        }
    }

    /// Offers `addr` to the routing table, subject to the routing policy.
    fn admit(&mut self, peer: PeerId, addr: Multiaddr) {
        if self.routing_closed {
            return;
        }
        if !self.policy.admits(&addr) {
            debug!("Not routing {} via non-public address {}", peer, addr);
            self.state.stats.routing_rejections.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.swarm.behaviour_mut().kademlia.add_address(&peer, addr);
    }

    fn progress_lookup(&mut self, query: kad::QueryId, last: bool) {
        let Some((peer, reply)) = self.pending_lookups.remove(&query) else {
            return;
        };

        let known = self.state.known_addresses(&peer);
        if !known.is_empty() {
            let _ = reply.send(Ok(known));
        } else if last {
            let _ = reply.send(Err(ChainwireError::Routing(format!("peer {} not found", peer))));
        } else {
            self.pending_lookups.insert(query, (peer, reply));
        }
    }

    fn trim_connections(&mut self) {
        for peer in self.guard.trim_candidates(Instant::now()) {
            debug!("Trimming connection to {}", peer);
            if self.swarm.disconnect_peer_id(peer).is_ok() {
                self.state.stats.connections_trimmed.fetch_add(1, Ordering::Relaxed);
                self.emit(NetworkEvent::ConnectionTrimmed(peer));
            }
        }
    }

    fn emit(&self, event: NetworkEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Dropping network event: {}", e);
        }
    }

    fn fail_pending(&mut self, reason: &str) {
        for (_, replies) in self.pending_dials.drain() {
            for reply in replies {
                let _ = reply.send(Err(ChainwireError::Network(reason.to_string())));
            }
        }
        for (_, (_, reply)) in self.pending_lookups.drain() {
            let _ = reply.send(Err(ChainwireError::Routing(reason.to_string())));
        }
    }
}
