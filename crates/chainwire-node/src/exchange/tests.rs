use super::*;
use crate::capability::{BlockExchange, BlockSource, Closeable, ExchangeServer};
use crate::storage::MemoryBlockstore;
use crate::supervisor::Context;
use chainwire_types::{cbor, Block, ChainwireError, ChainwireResult, ContentId, InitState};
use futures::stream::{self, BoxStream, StreamExt};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Span;

/// Delivers a fixed script of blocks in the given order, optionally never
/// closing afterwards, and counts requests and consumed items.
struct ScriptedSource {
    script: Vec<Block>,
    hang_after_script: bool,
    requests: AtomicUsize,
    consumed: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(script: Vec<Block>) -> Self {
        Self {
            script,
            hang_after_script: false,
            requests: AtomicUsize::new(0),
            consumed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn hanging(script: Vec<Block>) -> Self {
        Self {
            hang_after_script: true,
            ..Self::new(script)
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn consumed(&self) -> usize {
        self.consumed.load(Ordering::SeqCst)
    }
}

impl BlockSource for ScriptedSource {
    fn get_blocks(&self, _ctx: &Context, _ids: &[ContentId]) -> BoxStream<'static, Block> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let consumed = self.consumed.clone();
        let items = stream::iter(self.script.clone()).inspect(move |_| {
            consumed.fetch_add(1, Ordering::SeqCst);
        });
        if self.hang_after_script {
            items.chain(stream::pending()).boxed()
        } else {
            items.boxed()
        }
    }
}

fn block(tag: &str) -> Block {
    Block::new(tag.as_bytes().to_vec())
}

fn fetcher() -> BlockFetcher {
    BlockFetcher::new(Span::none())
}

#[tokio::test]
async fn test_result_follows_request_order() {
    let (a, b, c) = (block("a"), block("b"), block("c"));
    let source = ScriptedSource::new(vec![b.clone(), a.clone(), c.clone()]);
    let mut seen = Vec::new();

    let result = fetcher()
        .fetch(&Context::background(), &source, &[a.id(), b.id(), c.id()], |index, _| {
            seen.push(index);
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(result, vec![a, b, c]);
    assert_eq!(seen, vec![1, 0, 2]);
}

#[tokio::test]
async fn test_duplicate_request_issues_no_delivery() {
    let a = block("a");
    let source = ScriptedSource::new(vec![a.clone()]);

    let result = fetcher()
        .fetch(&Context::background(), &source, &[a.id(), a.id()], |_, _| Ok(()))
        .await;

    assert!(matches!(result, Err(ChainwireError::DuplicateRequest)));
    assert_eq!(source.requests(), 0);
}

#[tokio::test]
async fn test_unrequested_and_repeated_blocks_are_ignored() {
    let (a, b, stray) = (block("a"), block("b"), block("stray"));
    let source = ScriptedSource::new(vec![a.clone(), stray, a.clone(), b.clone()]);
    let mut calls = 0;

    let result = fetcher()
        .fetch(&Context::background(), &source, &[a.id(), b.id()], |_, _| {
            calls += 1;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(result, vec![a, b]);
    assert_eq!(calls, 2);
}

#[tokio::test]
async fn test_callback_error_aborts_without_consuming_more() {
    let (a, b, c) = (block("a"), block("b"), block("c"));
    let source = ScriptedSource::new(vec![a.clone(), b.clone(), c.clone()]);
    let bad = b.id();

    let result = fetcher()
        .fetch(&Context::background(), &source, &[a.id(), b.id(), c.id()], |_, blk| {
            if blk.id() == bad {
                Err(ChainwireError::Decode("bad block".into()))
            } else {
                Ok(())
            }
        })
        .await;

    match result {
        Err(ChainwireError::Decode(msg)) => assert_eq!(msg, "bad block"),
        other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
    }
    assert_eq!(source.consumed(), 2);
}

#[tokio::test]
async fn test_cancellation_reported_over_incomplete() {
    let (a, b) = (block("a"), block("b"));
    let source = ScriptedSource::hanging(vec![a.clone()]);
    let ctx = Context::background();

    let result = fetcher()
        .fetch(&ctx, &source, &[a.id(), b.id()], |_, _| {
            ctx.cancel();
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(ChainwireError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_ends_hanging_delivery() {
    let (a, b) = (block("a"), block("b"));
    let source = ScriptedSource::hanging(vec![a.clone()]);
    let ctx = Context::background().with_timeout(std::time::Duration::from_secs(30));

    let result = fetcher()
        .fetch(&ctx, &source, &[a.id(), b.id()], |_, _| Ok(()))
        .await;

    assert!(matches!(result, Err(ChainwireError::DeadlineExceeded)));
}

#[tokio::test]
async fn test_closed_stream_reports_missing_count() {
    let (a, b) = (block("a"), block("b"));
    let source = ScriptedSource::new(vec![a.clone()]);

    let result = fetcher()
        .fetch(&Context::background(), &source, &[a.id(), b.id()], |_, _| Ok(()))
        .await;

    match result {
        Err(e @ ChainwireError::FetchIncomplete { missing: 1 }) => {
            assert_eq!(e.to_string(), "Failed to fetch 1 blocks for unknown reasons");
        }
        other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
    }
}

#[tokio::test]
async fn test_empty_request_completes() {
    let source = ScriptedSource::new(vec![]);
    let result = fetcher()
        .fetch(&Context::background(), &source, &[], |_, _| Ok(()))
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_fetch_decoded_from_memory_store() {
    let store = MemoryBlockstore::new();
    let states: Vec<InitState> = (0..3)
        .map(|i| InitState {
            network_name: format!("net-{}", i),
            next_id: i,
        })
        .collect();
    let ids: Vec<ContentId> = states
        .iter()
        .map(|s| store.put_block(cbor::to_block(s).unwrap()))
        .collect();

    let decoded: Vec<InitState> = fetcher()
        .fetch_decoded(&Context::background(), &store, &ids)
        .await
        .unwrap();
    assert_eq!(decoded, states);
}

#[tokio::test]
async fn test_fetch_decoded_rejects_garbage() {
    let store = MemoryBlockstore::new();
    let id = store.put_block(block("not cbor"));

    let result: ChainwireResult<Vec<InitState>> = fetcher()
        .fetch_decoded(&Context::background(), &store, &[id])
        .await;
    assert!(matches!(result, Err(ChainwireError::Decode(_))));
}

#[tokio::test]
async fn test_offline_exchange_lifecycle() {
    let store = MemoryBlockstore::new();
    let id = store.put_block(block("local"));
    let exchange = OfflineExchange::new(Arc::new(store));

    exchange.register().await.unwrap();
    exchange.register().await.unwrap();
    assert!(exchange.is_registered());

    let ctx = Context::background();
    assert_eq!(exchange.get_blocks(&ctx, &[id]).count().await, 1);

    exchange.close().await.unwrap();
    assert!(exchange.is_closed());
    assert_eq!(exchange.get_blocks(&ctx, &[id]).count().await, 0);

    let _: &dyn BlockExchange = &exchange;
}

proptest! {
    #[test]
    fn prop_order_independent_of_delivery(
        delivery in (1usize..24).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let blocks: Vec<Block> = (0..delivery.len())
            .map(|i| Block::new(format!("block-{}", i).into_bytes()))
            .collect();
        let ids: Vec<ContentId> = blocks.iter().map(Block::id).collect();
        let script: Vec<Block> = delivery.iter().map(|&i| blocks[i].clone()).collect();
        let source = ScriptedSource::new(script);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let result = runtime
            .block_on(fetcher().fetch(&Context::background(), &source, &ids, |_, _| Ok(())))
            .unwrap();

        prop_assert_eq!(result, blocks);
    }
}
