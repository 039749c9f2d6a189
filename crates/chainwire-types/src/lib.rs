#![forbid(unsafe_code)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod cbor;
pub mod chain;
pub mod error;

pub use chain::{ActorState, BlockHeader, InitState, Message, SignedMessage, StateRoot, INIT_ACTOR_ADDRESS};
pub use error::{ChainwireError, ChainwireResult};

pub const CONTENT_ID_SIZE: usize = 32;

/// Network name used by nodes that do not derive it from genesis state.
pub const MAINNET_NETWORK_NAME: &str = "testnetnet";

/// Identifier of an immutable object: the BLAKE3 digest of its bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub [u8; CONTENT_ID_SIZE]);

impl ContentId {
    pub fn from_bytes(bytes: [u8; CONTENT_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; CONTENT_ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> ChainwireResult<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ChainwireError::Serialization(format!("invalid content id hex: {}", e)))?;
        if bytes.len() != CONTENT_ID_SIZE {
            return Err(ChainwireError::Serialization(format!(
                "invalid content id length: {} bytes",
                bytes.len()
            )));
        }
        let mut arr = [0u8; CONTENT_ID_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn zero() -> Self {
        Self([0u8; CONTENT_ID_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; CONTENT_ID_SIZE]
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.to_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = ChainwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::zero()
    }
}

/// A content-addressed data unit as delivered by a block source.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    id: ContentId,
    data: Vec<u8>,
}

impl Block {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            id: ContentId::of(&data),
            data,
        }
    }

    /// Pairs `data` with an identifier supplied by the sender. Use
    /// [`Block::verify`] before trusting the pairing.
    pub fn with_id(id: ContentId, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn verify(&self) -> bool {
        ContentId::of(&self.data) == self.id
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Resolved identity of the network this node belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub name: String,
    pub genesis: ContentId,
}

impl fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (genesis {})", self.name, self.genesis)
    }
}
