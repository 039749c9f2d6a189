#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod config;
pub mod exchange;
pub mod network;
pub mod p2p;
pub mod storage;
pub mod supervisor;

pub use capability::{
    BlockExchange, BlockSource, Closeable, ExchangeServer, HelloProtocol, ObjectStore,
    ObjectStoreExt, PeerConnector, PeerManager, PubSub, Routing,
};
pub use config::{LoggingConfig, NodeConfig, SwarmConfig, TransferConfig};
pub use exchange::{BlockFetcher, OfflineExchange};
pub use network::{Network, NetworkAssembler, NetworkNameResolver, NetworkParts, TransferRetry};
pub use p2p::{
    log_network_events, topics, ConnectionGuard, ConnectionWatermarks, Host, HostBuilder,
    KadRouter, NetworkEvent, NetworkStats, PeerAddress, PeerInfo, RoutedHost,
    RoutingConfigurator, RoutingMode,
};
pub use storage::{MemoryBlockstore, NodeStorage, StorageConfig};
pub use supervisor::{BackgroundTask, Context};
