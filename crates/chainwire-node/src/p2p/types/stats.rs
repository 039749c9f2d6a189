#[allow(deprecated)]
use libp2p::bandwidth::BandwidthSinks;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters kept by the swarm loop. `bytes_*` count gossip payloads only;
/// `transport` sees every byte on every substream.
#[allow(deprecated)]
pub struct NetworkStats {
    pub peer_count: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    pub messages_published: AtomicU64,
    pub messages_received: AtomicU64,
    pub connection_attempts: AtomicU64,
    pub connection_failures: AtomicU64,
    pub connections_trimmed: AtomicU64,
    pub routing_rejections: AtomicU64,
    transport: Option<Arc<BandwidthSinks>>,
    started_at: Instant,
}

impl Default for NetworkStats {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkStats {
    pub fn new() -> Self {
        Self {
            peer_count: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            messages_published: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            connection_attempts: AtomicU64::new(0),
            connection_failures: AtomicU64::new(0),
            connections_trimmed: AtomicU64::new(0),
            routing_rejections: AtomicU64::new(0),
            transport: None,
            started_at: Instant::now(),
        }
    }

    #[allow(deprecated)]
    pub fn with_transport(sinks: Arc<BandwidthSinks>) -> Self {
        Self {
            transport: Some(sinks),
            ..Self::new()
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    #[allow(deprecated)]
    pub fn snapshot(&self) -> NetworkStatsSnapshot {
        let (transport_bytes_in, transport_bytes_out) = self
            .transport
            .as_ref()
            .map(|sinks| (sinks.total_inbound(), sinks.total_outbound()))
            .unwrap_or_default();

        NetworkStatsSnapshot {
            peer_count: self.peer_count.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            connection_attempts: self.connection_attempts.load(Ordering::Relaxed),
            connection_failures: self.connection_failures.load(Ordering::Relaxed),
            connections_trimmed: self.connections_trimmed.load(Ordering::Relaxed),
            routing_rejections: self.routing_rejections.load(Ordering::Relaxed),
            transport_bytes_in,
            transport_bytes_out,
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkStatsSnapshot {
    pub peer_count: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub messages_published: u64,
    pub messages_received: u64,
    pub connection_attempts: u64,
    pub connection_failures: u64,
    pub connections_trimmed: u64,
    pub routing_rejections: u64,
    #[serde(default)]
    pub transport_bytes_in: u64,
    #[serde(default)]
    pub transport_bytes_out: u64,
    pub uptime_secs: u64,
}
