mod constants;
mod duration;
mod logging;
mod network;
mod node;
mod types;

pub use constants::*;
pub use duration::parse_duration;
pub use logging::LoggingConfig;
pub use network::{BootstrapConfig, NetworkParams, PubsubConfig, SwarmConfig, TransferConfig};
pub use node::NodeConfig;
pub use types::*;
