//! Capability interfaces for the subsystems the network facade is composed
//! from. Production wiring injects the libp2p-backed implementations; tests
//! inject fakes satisfying the same contracts.

use async_trait::async_trait;
use chainwire_types::{cbor, Block, ChainwireResult, ContentId};
use futures::stream::BoxStream;
use libp2p::PeerId;
use serde::{de::DeserializeOwned, Serialize};

use crate::p2p::{PeerAddress, RoutingMode};
use crate::supervisor::Context;

/// Anything holding resources that must be released at shutdown.
#[async_trait]
pub trait Closeable: Send + Sync {
    async fn close(&self) -> ChainwireResult<()>;
}

/// Delivers blocks for a requested id set as a stream, in any order, until
/// every available block has been sent or `ctx` is done. The stream closes
/// when delivery ends; missing blocks are simply never yielded.
pub trait BlockSource: Send + Sync {
    fn get_blocks(&self, ctx: &Context, ids: &[ContentId]) -> BoxStream<'static, Block>;
}

/// Content-addressed raw object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_raw(&self, id: &ContentId) -> ChainwireResult<Option<Vec<u8>>>;

    async fn put_raw(&self, data: Vec<u8>) -> ChainwireResult<ContentId>;
}

/// DAG-CBOR helpers available on every [`ObjectStore`].
#[async_trait]
pub trait ObjectStoreExt: ObjectStore {
    async fn get_cbor<T>(&self, id: &ContentId) -> ChainwireResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_raw(id).await? {
            Some(bytes) => Ok(Some(cbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_cbor<T>(&self, value: &T) -> ChainwireResult<ContentId>
    where
        T: Serialize + Sync,
    {
        let bytes = cbor::encode(value)?;
        self.put_raw(bytes).await
    }
}

impl<S: ObjectStore + ?Sized> ObjectStoreExt for S {}

/// The block exchange subsystem: a remote block source that owns connections
/// and must be closed on shutdown.
pub trait BlockExchange: BlockSource + Closeable {}

/// Server side of the chain exchange protocol.
#[async_trait]
pub trait ExchangeServer: Send + Sync {
    async fn register(&self) -> ChainwireResult<()>;
}

/// Hello handshake handler.
#[async_trait]
pub trait HelloProtocol: Send + Sync {
    async fn register(&self) -> ChainwireResult<()>;
}

/// Long-lived peer maintenance loop. Returns once `ctx` is cancelled.
#[async_trait]
pub trait PeerManager: Send + Sync {
    async fn run(&self, ctx: Context) -> ChainwireResult<()>;
}

#[async_trait]
pub trait PubSub: Send + Sync {
    async fn publish(&self, topic: &str, data: Vec<u8>) -> ChainwireResult<()>;

    async fn subscribe(&self, topic: &str) -> ChainwireResult<()>;

    async fn unsubscribe(&self, topic: &str) -> ChainwireResult<()>;
}

/// Peer routing. Every implementation is closeable.
#[async_trait]
pub trait Routing: Closeable {
    async fn find_peer(&self, ctx: &Context, peer: PeerId) -> ChainwireResult<PeerAddress>;

    async fn bootstrap(&self) -> ChainwireResult<()>;

    /// The configured routing mode. Never changes after construction.
    fn mode(&self) -> RoutingMode;
}

/// Connection operations the peer manager drives.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    fn connected_peers(&self) -> usize;

    fn is_connected(&self, peer: &PeerId) -> bool;

    async fn connect(&self, ctx: &Context, peer: &PeerAddress) -> ChainwireResult<()>;
}
