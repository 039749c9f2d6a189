use crate::capability::BlockSource;
use crate::supervisor::Context;
use chainwire_types::{cbor, Block, ChainwireError, ChainwireResult, ContentId};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, warn, Instrument, Span};

/// Retrieves a batch of content-addressed blocks from a [`BlockSource`].
///
/// The result is aligned index-for-index with the request regardless of the
/// order in which the source delivers. Each call owns its own bookkeeping, so
/// concurrent fetches against one source need no coordination.
#[derive(Clone)]
pub struct BlockFetcher {
    span: Span,
}

impl BlockFetcher {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    /// Fetches `ids`, invoking `on_block(index, block)` synchronously as each
    /// requested block arrives.
    ///
    /// Duplicate ids fail with [`ChainwireError::DuplicateRequest`] before the
    /// source is contacted. An error from `on_block` cancels delivery and is
    /// returned as-is. When delivery ends with blocks outstanding, the
    /// context's own error takes precedence over
    /// [`ChainwireError::FetchIncomplete`].
    pub async fn fetch<F>(
        &self,
        ctx: &Context,
        source: &dyn BlockSource,
        ids: &[ContentId],
        on_block: F,
    ) -> ChainwireResult<Vec<Block>>
    where
        F: FnMut(usize, &Block) -> ChainwireResult<()> + Send,
    {
        self.fetch_inner(ctx, source, ids, on_block)
            .instrument(self.span.clone())
            .await
    }

    async fn fetch_inner<F>(
        &self,
        ctx: &Context,
        source: &dyn BlockSource,
        ids: &[ContentId],
        mut on_block: F,
    ) -> ChainwireResult<Vec<Block>>
    where
        F: FnMut(usize, &Block) -> ChainwireResult<()> + Send,
    {
        let mut pending: HashMap<ContentId, usize> =
            ids.iter().enumerate().map(|(index, id)| (*id, index)).collect();
        if pending.len() != ids.len() {
            return Err(ChainwireError::DuplicateRequest);
        }

        let mut slots: Vec<Option<Block>> = (0..ids.len()).map(|_| None).collect();

        let delivery = ctx.child();
        let _cancel_delivery = delivery.cancel_on_drop();
        let mut stream = source.get_blocks(&delivery, ids);

        loop {
            let block = tokio::select! {
                biased;
                _ = delivery.done() => break,
                next = stream.next() => match next {
                    Some(block) => block,
                    None => break,
                },
            };

            let Some(index) = pending.remove(&block.id()) else {
                warn!("Received block {} that was not pending", block.id());
                continue;
            };

            on_block(index, &block)?;
            slots[index] = Some(block);
        }

        if !pending.is_empty() {
            if let Some(err) = ctx.err() {
                return Err(err);
            }
            return Err(ChainwireError::FetchIncomplete {
                missing: pending.len(),
            });
        }

        debug!("Fetched {} blocks", ids.len());
        Ok(slots.into_iter().flatten().collect())
    }

    /// Fetches `ids` and decodes every block as DAG-CBOR into `T`, in request
    /// order. A single undecodable block fails the whole batch.
    pub async fn fetch_decoded<T>(
        &self,
        ctx: &Context,
        source: &dyn BlockSource,
        ids: &[ContentId],
    ) -> ChainwireResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let mut decoded: Vec<Option<T>> = (0..ids.len()).map(|_| None).collect();

        self.fetch(ctx, source, ids, |index, block| {
            decoded[index] = Some(cbor::decode(block.data())?);
            Ok(())
        })
        .await?;

        Ok(decoded.into_iter().flatten().collect())
    }
}
