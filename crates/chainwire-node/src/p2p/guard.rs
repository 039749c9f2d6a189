use super::types::PeerAddress;
use crate::config::parse_duration;
use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::PeerId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, Span};

const TAG_CONFIGURED: &str = "config-prot";
const TAG_BOOTSTRAP: &str = "bootstrap";
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionWatermarks {
    pub low: u32,
    pub high: u32,
    pub grace: Duration,
}

impl ConnectionWatermarks {
    pub fn new(low: u32, high: u32, grace: Duration) -> ChainwireResult<Self> {
        if low > high {
            return Err(ChainwireError::InvalidWatermarks { low, high });
        }
        Ok(Self { low, high, grace })
    }

    /// Like [`ConnectionWatermarks::new`], with the grace period given as a
    /// duration string such as `20s`.
    pub fn parse(low: u32, high: u32, grace: &str) -> ChainwireResult<Self> {
        Self::new(low, high, parse_duration(grace)?)
    }
}

/// Watermark-based connection limiting that never selects a protected peer.
///
/// The protected set is fixed at construction, before any connection is
/// observed, so trimming decisions never race with protection.
pub struct ConnectionGuard {
    watermarks: ConnectionWatermarks,
    protected: HashMap<PeerId, &'static str>,
    connected: RwLock<HashMap<PeerId, LivePeer>>,
    span: Span,
}

#[derive(Clone, Copy, Debug)]
struct LivePeer {
    since: Instant,
    connections: usize,
}

impl ConnectionGuard {
    pub fn new(
        watermarks: ConnectionWatermarks,
        protected_ids: &[String],
        bootstrap_peers: &[PeerAddress],
        span: Span,
    ) -> ChainwireResult<Self> {
        let mut protected = HashMap::new();

        for id in protected_ids {
            let peer: PeerId = id
                .parse()
                .map_err(|e| ChainwireError::InvalidPeerId(format!("{}: {}", id, e)))?;
            protected.insert(peer, TAG_CONFIGURED);
        }
        for peer in bootstrap_peers {
            protected.entry(peer.peer_id()).or_insert(TAG_BOOTSTRAP);
        }

        span.in_scope(|| {
            info!(
                "Connection guard active: low={} high={} grace={:?} protected={}",
                watermarks.low,
                watermarks.high,
                watermarks.grace,
                protected.len()
            )
        });

        Ok(Self {
            watermarks,
            protected,
            connected: RwLock::new(HashMap::new()),
            span,
        })
    }

    pub fn watermarks(&self) -> ConnectionWatermarks {
        self.watermarks
    }

    pub fn is_protected(&self, peer: &PeerId) -> bool {
        self.protected.contains_key(peer)
    }

    pub fn protection_tag(&self, peer: &PeerId) -> Option<&'static str> {
        self.protected.get(peer).copied()
    }

    pub fn protected_count(&self) -> usize {
        self.protected.len()
    }

    /// Records one more live connection to `peer`. The peer's age is taken
    /// from its first open connection.
    pub fn on_connected(&self, peer: PeerId, at: Instant) {
        self.connected
            .write()
            .entry(peer)
            .or_insert(LivePeer {
                since: at,
                connections: 0,
            })
            .connections += 1;
    }

    /// Records one closed connection. The peer is forgotten once its last
    /// connection closes.
    pub fn on_disconnected(&self, peer: &PeerId) {
        let mut connected = self.connected.write();
        if let Some(live) = connected.get_mut(peer) {
            live.connections = live.connections.saturating_sub(1);
            if live.connections == 0 {
                connected.remove(peer);
            }
        }
    }

    /// Live connections across all peers; this is what the watermarks bound.
    pub fn connection_count(&self) -> usize {
        self.connected.read().values().map(|l| l.connections).sum()
    }

    pub fn peer_count(&self) -> usize {
        self.connected.read().len()
    }

    /// Peers to disconnect so that the live connection count falls back to
    /// the low watermark. Empty unless the count exceeds the high watermark.
    /// Only unprotected peers connected for at least the grace period
    /// qualify; the most recently connected go first, and trimming a peer
    /// closes all of its connections.
    pub fn trim_candidates(&self, now: Instant) -> Vec<PeerId> {
        let connected = self.connected.read();
        let live: usize = connected.values().map(|l| l.connections).sum();
        if live <= self.watermarks.high as usize {
            return Vec::new();
        }

        let excess = live - self.watermarks.low as usize;
        let mut eligible: Vec<(PeerId, LivePeer)> = connected
            .iter()
            .filter(|(peer, _)| !self.protected.contains_key(peer))
            .filter(|(_, l)| now.saturating_duration_since(l.since) >= self.watermarks.grace)
            .map(|(peer, l)| (*peer, *l))
            .collect();

        eligible.sort_by(|a, b| b.1.since.cmp(&a.1.since));
        let mut released = 0;
        let mut selected = Vec::new();
        for (peer, l) in eligible {
            if released >= excess {
                break;
            }
            released += l.connections;
            selected.push(peer);
        }

        self.span.in_scope(|| {
            debug!(
                "Trim sweep: live={} excess={} selected={} released={}",
                live,
                excess,
                selected.len(),
                released
            )
        });
        selected
    }

    pub fn sweep_interval(&self) -> Duration {
        (self.watermarks.grace / 2).max(MIN_SWEEP_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(low: u32, high: u32, grace: Duration, protected: &[PeerId]) -> ConnectionGuard {
        let ids: Vec<String> = protected.iter().map(|p| p.to_string()).collect();
        ConnectionGuard::new(
            ConnectionWatermarks::new(low, high, grace).unwrap(),
            &ids,
            &[],
            Span::none(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_inverted_watermarks() {
        assert!(matches!(
            ConnectionWatermarks::new(10, 5, Duration::ZERO),
            Err(ChainwireError::InvalidWatermarks { low: 10, high: 5 })
        ));
        assert!(ConnectionWatermarks::new(5, 5, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_parse_grace() {
        let w = ConnectionWatermarks::parse(150, 180, "20s").unwrap();
        assert_eq!(w.grace, Duration::from_secs(20));
        assert!(matches!(
            ConnectionWatermarks::parse(150, 180, "soon"),
            Err(ChainwireError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_rejects_bad_protected_id() {
        let result = ConnectionGuard::new(
            ConnectionWatermarks::new(1, 2, Duration::ZERO).unwrap(),
            &["definitely-not-a-peer".to_string()],
            &[],
            Span::none(),
        );
        assert!(matches!(result, Err(ChainwireError::InvalidPeerId(_))));
    }

    #[test]
    fn test_bootstrap_peers_are_protected() {
        let boot = PeerId::random();
        let configured = PeerId::random();
        let guard = ConnectionGuard::new(
            ConnectionWatermarks::new(1, 2, Duration::ZERO).unwrap(),
            &[configured.to_string()],
            &[PeerAddress::new(boot, vec![]), PeerAddress::new(configured, vec![])],
            Span::none(),
        )
        .unwrap();

        assert_eq!(guard.protection_tag(&boot), Some("bootstrap"));
        assert_eq!(guard.protection_tag(&configured), Some("config-prot"));
        assert_eq!(guard.protected_count(), 2);
    }

    #[test]
    fn test_no_trim_at_or_below_high() {
        let guard = guard(1, 3, Duration::ZERO, &[]);
        let t0 = Instant::now();
        for _ in 0..3 {
            guard.on_connected(PeerId::random(), t0);
        }
        assert!(guard.trim_candidates(t0 + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn test_never_trims_protected_peers() {
        let protected: Vec<PeerId> = (0..6).map(|_| PeerId::random()).collect();
        let guard = guard(0, 2, Duration::ZERO, &protected);
        let t0 = Instant::now();
        for peer in &protected {
            guard.on_connected(*peer, t0);
        }
        let extra = PeerId::random();
        guard.on_connected(extra, t0);

        let trimmed = guard.trim_candidates(t0 + Duration::from_secs(60));
        assert_eq!(trimmed, vec![extra]);
        assert!(trimmed.iter().all(|p| !guard.is_protected(p)));
    }

    #[test]
    fn test_grace_period_shields_new_peers() {
        let guard = guard(1, 2, Duration::from_secs(20), &[]);
        let t0 = Instant::now();
        let old = PeerId::random();
        guard.on_connected(old, t0);
        let fresh_a = PeerId::random();
        let fresh_b = PeerId::random();
        guard.on_connected(fresh_a, t0 + Duration::from_secs(15));
        guard.on_connected(fresh_b, t0 + Duration::from_secs(15));

        let trimmed = guard.trim_candidates(t0 + Duration::from_secs(25));
        assert_eq!(trimmed, vec![old]);
    }

    #[test]
    fn test_trims_youngest_first_down_to_low() {
        let guard = guard(2, 3, Duration::ZERO, &[]);
        let t0 = Instant::now();
        let peers: Vec<PeerId> = (0..5).map(|_| PeerId::random()).collect();
        for (i, peer) in peers.iter().enumerate() {
            guard.on_connected(*peer, t0 + Duration::from_secs(i as u64));
        }

        let trimmed = guard.trim_candidates(t0 + Duration::from_secs(60));
        assert_eq!(trimmed, vec![peers[4], peers[3], peers[2]]);
    }

    #[test]
    fn test_disconnect_and_sweep_interval() {
        let tight = guard(1, 2, Duration::ZERO, &[]);
        assert_eq!(tight.sweep_interval(), Duration::from_secs(1));

        let guard = guard(1, 2, Duration::from_secs(20), &[]);
        let peer = PeerId::random();
        guard.on_connected(peer, Instant::now());
        guard.on_connected(peer, Instant::now());
        assert_eq!(guard.connection_count(), 2);
        assert_eq!(guard.peer_count(), 1);
        guard.on_disconnected(&peer);
        assert_eq!(guard.connection_count(), 1);
        guard.on_disconnected(&peer);
        assert_eq!(guard.connection_count(), 0);
        assert_eq!(guard.peer_count(), 0);
        guard.on_disconnected(&peer);
        assert_eq!(guard.connection_count(), 0);

        assert_eq!(guard.sweep_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_parallel_connections_count_toward_watermarks() {
        let guard = guard(1, 3, Duration::ZERO, &[]);
        let t0 = Instant::now();
        let busy = PeerId::random();
        for _ in 0..4 {
            guard.on_connected(busy, t0);
        }
        assert_eq!(guard.peer_count(), 1);
        assert_eq!(guard.connection_count(), 4);

        let trimmed = guard.trim_candidates(t0 + Duration::from_secs(60));
        assert_eq!(trimmed, vec![busy]);
    }

    #[test]
    fn test_trim_stops_once_enough_connections_are_released() {
        let guard = guard(2, 4, Duration::ZERO, &[]);
        let t0 = Instant::now();
        let old = PeerId::random();
        let young = PeerId::random();
        guard.on_connected(old, t0);
        guard.on_connected(old, t0);
        for _ in 0..3 {
            guard.on_connected(young, t0 + Duration::from_secs(5));
        }

        // 5 live, 3 over low; the young peer alone releases them.
        let trimmed = guard.trim_candidates(t0 + Duration::from_secs(60));
        assert_eq!(trimmed, vec![young]);
    }
}
