//! The assembled network facade.
//!
//! [`Network`] owns the host, router, exchange and peer manager for the
//! lifetime of the process. It is built either by [`NetworkAssembler`] from
//! configuration, or from explicit [`NetworkParts`] when the caller supplies
//! its own collaborators.

mod accessors;
mod assemble;
mod lifecycle;
mod messages;
mod resolver;
mod retry;

pub use assemble::NetworkAssembler;
pub use resolver::NetworkNameResolver;
pub use retry::TransferRetry;

use crate::capability::{
    BlockExchange, Closeable, ExchangeServer, HelloProtocol, PeerManager, PubSub, Routing,
};
use crate::exchange::BlockFetcher;
use crate::p2p::RoutedHost;
use crate::supervisor::BackgroundTask;
use chainwire_types::NetworkIdentity;
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::Span;

/// Collaborators a [`Network`] is composed from.
pub struct NetworkParts {
    pub identity: NetworkIdentity,
    pub offline: bool,
    pub host: Arc<dyn Closeable>,
    pub pubsub: Arc<dyn PubSub>,
    pub router: Arc<dyn Routing>,
    pub exchange: Arc<dyn BlockExchange>,
    pub exchange_server: Arc<dyn ExchangeServer>,
    pub hello: Arc<dyn HelloProtocol>,
    pub peer_manager: Arc<dyn PeerManager>,
    pub transfer_retry: TransferRetry,
    /// The live transport, when the parts were built by the assembler.
    pub routed_host: Option<RoutedHost>,
}

pub struct Network {
    identity: NetworkIdentity,
    offline: bool,
    host: Arc<dyn Closeable>,
    pubsub: Arc<dyn PubSub>,
    router: Arc<dyn Routing>,
    exchange: Arc<dyn BlockExchange>,
    exchange_server: Arc<dyn ExchangeServer>,
    hello: Arc<dyn HelloProtocol>,
    peer_manager: Arc<dyn PeerManager>,
    transfer_retry: TransferRetry,
    routed_host: Option<RoutedHost>,
    fetcher: BlockFetcher,
    started: AtomicBool,
    peer_task: Mutex<Option<BackgroundTask>>,
    span: Span,
}

impl Network {
    pub fn from_parts(parts: NetworkParts, span: Span) -> Self {
        Self {
            identity: parts.identity,
            offline: parts.offline,
            host: parts.host,
            pubsub: parts.pubsub,
            router: parts.router,
            exchange: parts.exchange,
            exchange_server: parts.exchange_server,
            hello: parts.hello,
            peer_manager: parts.peer_manager,
            transfer_retry: parts.transfer_retry,
            routed_host: parts.routed_host,
            fetcher: BlockFetcher::new(tracing::info_span!(parent: &span, "fetch")),
            started: AtomicBool::new(false),
            peer_task: Mutex::new(None),
            span,
        }
    }
}
