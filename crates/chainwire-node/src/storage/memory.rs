use crate::capability::{BlockSource, ObjectStore};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::{Block, ChainwireResult, ContentId};
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory block store for tests and tooling.
#[derive(Clone, Default)]
pub struct MemoryBlockstore {
    blocks: Arc<RwLock<HashMap<ContentId, Vec<u8>>>>,
}

impl MemoryBlockstore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_block(&self, block: Block) -> ContentId {
        let id = block.id();
        self.blocks.write().insert(id, block.into_data());
        id
    }

    pub fn get_block(&self, id: &ContentId) -> Option<Block> {
        self.blocks
            .read()
            .get(id)
            .map(|data| Block::with_id(*id, data.clone()))
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryBlockstore {
    async fn get_raw(&self, id: &ContentId) -> ChainwireResult<Option<Vec<u8>>> {
        Ok(self.blocks.read().get(id).cloned())
    }

    async fn put_raw(&self, data: Vec<u8>) -> ChainwireResult<ContentId> {
        Ok(self.put_block(Block::new(data)))
    }
}

impl BlockSource for MemoryBlockstore {
    fn get_blocks(&self, ctx: &Context, ids: &[ContentId]) -> BoxStream<'static, Block> {
        let found: Vec<Block> = ids.iter().filter_map(|id| self.get_block(id)).collect();
        let ctx = ctx.clone();
        stream::iter(found)
            .take_until(async move { ctx.done().await })
            .boxed()
    }
}
