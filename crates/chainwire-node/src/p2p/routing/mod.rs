mod configurator;
mod filter;
mod gate;
mod mode;
mod router;

pub use configurator::{RoutingConfigurator, RoutingPolicy};
pub use filter::{is_public_ipv4, is_public_ipv6, is_public_multiaddr};
pub use gate::PublicDialGate;
pub use mode::RoutingMode;
pub use router::KadRouter;

#[cfg(test)]
mod tests;
