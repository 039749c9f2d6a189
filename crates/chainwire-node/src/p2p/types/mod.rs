mod backoff;
mod commands;
mod peer_address;
mod peer_info;
mod stats;

pub use backoff::BackoffStrategy;
pub use commands::{NetworkCommand, NetworkEvent, Reply};
pub use peer_address::PeerAddress;
pub use peer_info::PeerInfo;
pub use stats::{NetworkStats, NetworkStatsSnapshot};
