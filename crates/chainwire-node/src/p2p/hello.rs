use crate::capability::{HelloProtocol, PubSub};
use async_trait::async_trait;
use chainwire_types::{ChainwireResult, NetworkIdentity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Default hello handler: joins the network's hello topic so peers greeting
/// the network reach this node. Greeting contents are handled by whoever
/// consumes the host event stream.
pub struct HelloService {
    pubsub: Arc<dyn PubSub>,
    identity: NetworkIdentity,
    registered: AtomicBool,
}

impl HelloService {
    pub fn new(pubsub: Arc<dyn PubSub>, identity: NetworkIdentity) -> Self {
        Self {
            pubsub,
            identity,
            registered: AtomicBool::new(false),
        }
    }

    pub fn topic(&self) -> String {
        super::topics::hello(&self.identity.name)
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HelloProtocol for HelloService {
    async fn register(&self) -> ChainwireResult<()> {
        if self.registered.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.pubsub.subscribe(&self.topic()).await?;
        self.registered.store(true, Ordering::Relaxed);
        info!("Hello handler registered for {}", self.identity);
        Ok(())
    }
}
