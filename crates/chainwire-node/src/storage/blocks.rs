use super::NodeStorage;
use crate::capability::{BlockSource, ObjectStore};
use crate::supervisor::Context;
use async_trait::async_trait;
use chainwire_types::{Block, ChainwireError, ChainwireResult, ContentId};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, warn};

impl NodeStorage {
    pub fn put_block(&self, block: &Block) -> ChainwireResult<()> {
        self.blocks
            .insert(block.id().as_bytes(), block.data())
            .map_err(|e| {
                self.metrics.record_error();
                ChainwireError::Storage(format!("Failed to store block {}: {}", block.id(), e))
            })?;
        self.metrics.record_write(block.len());
        Ok(())
    }

    pub fn get_block(&self, id: &ContentId) -> ChainwireResult<Option<Block>> {
        let value = self.blocks.get(id.as_bytes()).map_err(|e| {
            self.metrics.record_error();
            ChainwireError::Storage(format!("Failed to load block {}: {}", id, e))
        })?;
        self.metrics.record_read(value.as_ref().map(|v| v.len()));
        Ok(value.map(|v| Block::with_id(*id, v.to_vec())))
    }

    pub fn has_block(&self, id: &ContentId) -> ChainwireResult<bool> {
        self.blocks
            .contains_key(id.as_bytes())
            .map_err(|e| ChainwireError::Storage(format!("Failed to query block {}: {}", id, e)))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

#[async_trait]
impl ObjectStore for NodeStorage {
    async fn get_raw(&self, id: &ContentId) -> ChainwireResult<Option<Vec<u8>>> {
        Ok(self.get_block(id)?.map(Block::into_data))
    }

    async fn put_raw(&self, data: Vec<u8>) -> ChainwireResult<ContentId> {
        let block = Block::new(data);
        self.put_block(&block)?;
        Ok(block.id())
    }
}

impl BlockSource for NodeStorage {
    fn get_blocks(&self, ctx: &Context, ids: &[ContentId]) -> BoxStream<'static, Block> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_block(id) {
                Ok(Some(block)) => found.push(block),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable block {}: {}", id, e),
            }
        }
        debug!("Serving {} of {} requested blocks from local store", found.len(), ids.len());

        let ctx = ctx.clone();
        stream::iter(found)
            .take_until(async move { ctx.done().await })
            .boxed()
    }
}
