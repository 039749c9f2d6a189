use super::Network;
use crate::capability::{BlockExchange, BlockSource};
use crate::supervisor::Context;
use chainwire_types::{Block, ChainwireResult, ContentId, Message, SignedMessage};
use futures::stream::BoxStream;

struct ExchangeSource<'a>(&'a dyn BlockExchange);

impl BlockSource for ExchangeSource<'_> {
    fn get_blocks(&self, ctx: &Context, ids: &[ContentId]) -> BoxStream<'static, Block> {
        self.0.get_blocks(ctx, ids)
    }
}

impl Network {
    /// Fetches raw blocks in request order.
    pub async fn fetch_blocks(
        &self,
        ctx: &Context,
        source: &dyn BlockSource,
        ids: &[ContentId],
    ) -> ChainwireResult<Vec<Block>> {
        self.fetcher.fetch(ctx, source, ids, |_, _| Ok(())).await
    }

    /// Fetches blocks through the exchange subsystem.
    pub async fn fetch_from_exchange(
        &self,
        ctx: &Context,
        ids: &[ContentId],
    ) -> ChainwireResult<Vec<Block>> {
        self.fetch_blocks(ctx, &ExchangeSource(self.exchange.as_ref()), ids)
            .await
    }

    pub async fn fetch_messages(
        &self,
        ctx: &Context,
        source: &dyn BlockSource,
        ids: &[ContentId],
    ) -> ChainwireResult<Vec<Message>> {
        self.fetcher.fetch_decoded(ctx, source, ids).await
    }

    pub async fn fetch_signed_messages(
        &self,
        ctx: &Context,
        source: &dyn BlockSource,
        ids: &[ContentId],
    ) -> ChainwireResult<Vec<SignedMessage>> {
        self.fetcher.fetch_decoded(ctx, source, ids).await
    }
}
