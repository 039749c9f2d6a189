use crate::capability::{BlockExchange, BlockSource, Closeable, ExchangeServer};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::{Block, ChainwireResult, ContentId};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Block exchange that only serves what the local store already holds.
pub struct OfflineExchange {
    local: Arc<dyn BlockSource>,
    registered: AtomicBool,
    closed: AtomicBool,
}

impl OfflineExchange {
    pub fn new(local: Arc<dyn BlockSource>) -> Self {
        Self {
            local,
            registered: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

impl BlockSource for OfflineExchange {
    fn get_blocks(&self, ctx: &Context, ids: &[ContentId]) -> BoxStream<'static, Block> {
        if self.is_closed() {
            debug!("Exchange closed, delivering nothing");
            return stream::empty().boxed();
        }
        self.local.get_blocks(ctx, ids)
    }
}

#[async_trait]
impl Closeable for OfflineExchange {
    async fn close(&self) -> ChainwireResult<()> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

impl BlockExchange for OfflineExchange {}

#[async_trait]
impl ExchangeServer for OfflineExchange {
    async fn register(&self) -> ChainwireResult<()> {
        if !self.registered.swap(true, Ordering::Relaxed) {
            info!("Chain exchange serving local blocks only");
        }
        Ok(())
    }
}
