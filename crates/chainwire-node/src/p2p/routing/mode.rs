use libp2p::kad;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configured routing stance. Fixed at construction; only `Auto` lets the
/// routing layer change its effective behaviour at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    Client,
    Server,
    Auto,
}

impl RoutingMode {
    /// Rendezvous nodes serve the routing table; everyone else adapts to
    /// observed reachability.
    pub fn for_node(bootstrapper: bool) -> Self {
        if bootstrapper {
            RoutingMode::Server
        } else {
            RoutingMode::Auto
        }
    }

    pub(crate) fn kad_mode(self) -> Option<kad::Mode> {
        match self {
            RoutingMode::Client => Some(kad::Mode::Client),
            RoutingMode::Server => Some(kad::Mode::Server),
            RoutingMode::Auto => None,
        }
    }

    /// The mode to force back when the routing layer reports `observed`, or
    /// `None` if the observation is allowed.
    pub fn correction(self, observed: kad::Mode) -> Option<kad::Mode> {
        match (self.kad_mode(), observed) {
            (Some(pinned), observed) if pinned != observed => Some(pinned),
            _ => None,
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Client => write!(f, "client"),
            RoutingMode::Server => write!(f, "server"),
            RoutingMode::Auto => write!(f, "auto"),
        }
    }
}
