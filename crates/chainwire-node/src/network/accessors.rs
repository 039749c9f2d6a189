use super::{Network, TransferRetry};
use crate::capability::{BlockExchange, PubSub};
use crate::exchange::BlockFetcher;
use crate::p2p::{RoutedHost, RoutingMode};
use chainwire_types::{ContentId, NetworkIdentity};
use std::sync::atomic::Ordering;
use std::sync::Arc;

impl Network {
    pub fn identity(&self) -> &NetworkIdentity {
        &self.identity
    }

    pub fn network_name(&self) -> &str {
        &self.identity.name
    }

    pub fn genesis(&self) -> ContentId {
        self.identity.genesis
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn routing_mode(&self) -> RoutingMode {
        self.router.mode()
    }

    pub fn transfer_retry(&self) -> &TransferRetry {
        &self.transfer_retry
    }

    pub fn pubsub(&self) -> &Arc<dyn PubSub> {
        &self.pubsub
    }

    pub fn exchange(&self) -> &Arc<dyn BlockExchange> {
        &self.exchange
    }

    pub fn fetcher(&self) -> &BlockFetcher {
        &self.fetcher
    }

    pub fn routed_host(&self) -> Option<&RoutedHost> {
        self.routed_host.as_ref()
    }

    pub fn blocks_topic(&self) -> String {
        crate::p2p::topics::blocks(&self.identity.name)
    }

    pub fn messages_topic(&self) -> String {
        crate::p2p::topics::messages(&self.identity.name)
    }
}
