use super::*;
use crate::capability::{BlockSource, ObjectStoreExt};
use crate::supervisor::Context;
use chainwire_types::{Block, ContentId, InitState};
use futures::StreamExt;

#[test]
fn test_block_round_trip() {
    let storage = NodeStorage::in_memory().unwrap();
    let block = Block::new(b"hello chain".to_vec());

    storage.put_block(&block).unwrap();
    assert!(storage.has_block(&block.id()).unwrap());
    assert_eq!(storage.get_block(&block.id()).unwrap(), Some(block));
    assert_eq!(storage.block_count(), 1);
    assert!(storage.is_in_memory());
}

#[test]
fn test_missing_block_counts_miss() {
    let storage = NodeStorage::in_memory().unwrap();
    assert!(storage.get_block(&ContentId::of(b"absent")).unwrap().is_none());
    assert_eq!(storage.storage_metrics().snapshot().misses, 1);
}

#[test]
fn test_keypair_persisted_once() {
    let storage = NodeStorage::in_memory().unwrap();
    assert!(storage.load_keypair().unwrap().is_none());

    let first = storage.load_or_create_keypair().unwrap();
    let second = storage.load_or_create_keypair().unwrap();
    assert_eq!(first.public().to_peer_id(), second.public().to_peer_id());
}

#[tokio::test]
async fn test_cbor_helpers() {
    let storage = NodeStorage::in_memory().unwrap();
    let state = InitState {
        network_name: "localnet".to_string(),
        next_id: 7,
    };

    let id = storage.put_cbor(&state).await.unwrap();
    let loaded: Option<InitState> = storage.get_cbor(&id).await.unwrap();
    assert_eq!(loaded, Some(state));
}

#[tokio::test]
async fn test_local_source_serves_present_subset() {
    let storage = NodeStorage::in_memory().unwrap();
    let a = Block::new(b"a".to_vec());
    let b = Block::new(b"b".to_vec());
    storage.put_block(&a).unwrap();

    let ctx = Context::background();
    let delivered: Vec<Block> = storage
        .get_blocks(&ctx, &[a.id(), b.id()])
        .collect()
        .await;
    assert_eq!(delivered, vec![a]);
}

#[tokio::test]
async fn test_cancelled_source_delivers_nothing() {
    let memory = MemoryBlockstore::new();
    let id = memory.put_block(Block::new(b"x".to_vec()));

    let ctx = Context::background();
    ctx.cancel();
    let delivered: Vec<Block> = memory.get_blocks(&ctx, &[id]).collect().await;
    assert!(delivered.is_empty());
}
