pub const DEFAULT_P2P_PORT: u16 = 1347;
pub const DEFAULT_CONN_MGR_LOW: u32 = 150;
pub const DEFAULT_CONN_MGR_HIGH: u32 = 180;
pub const DEFAULT_CONN_MGR_GRACE: &str = "20s";
pub const DEFAULT_BOOTSTRAP_PERIOD: &str = "30s";
pub const DEFAULT_MIN_PEERS: u32 = 3;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1 << 20;

pub const DEFAULT_TRANSFER_INITIAL_DELAY: &str = "1s";
pub const DEFAULT_TRANSFER_MAX_DELAY: &str = "5m";
pub const DEFAULT_TRANSFER_ATTEMPTS: u32 = 15;
pub const DEFAULT_TRANSFER_FACTOR: f64 = 5.0;
