//! DAG-CBOR encoding for chain objects.

use crate::error::{ChainwireError, ChainwireResult};
use crate::{Block, ContentId};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(value: &T) -> ChainwireResult<Vec<u8>> {
    serde_ipld_dagcbor::to_vec(value)
        .map_err(|e| ChainwireError::Serialization(format!("Failed to encode DAG-CBOR: {}", e)))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ChainwireResult<T> {
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| ChainwireError::Decode(e.to_string()))
}

/// Encodes `value` and wraps it in a block addressed by its encoding.
pub fn to_block<T: Serialize>(value: &T) -> ChainwireResult<Block> {
    Ok(Block::new(encode(value)?))
}

pub fn content_id<T: Serialize>(value: &T) -> ChainwireResult<ContentId> {
    Ok(ContentId::of(&encode(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::InitState;

    #[test]
    fn test_block_id_matches_encoding() {
        let state = InitState {
            network_name: "localnet".to_string(),
            next_id: 1000,
        };
        let block = to_block(&state).unwrap();
        assert_eq!(block.id(), content_id(&state).unwrap());

        let decoded: InitState = decode(block.data()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let result: ChainwireResult<InitState> = decode(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(ChainwireError::Decode(_))));
    }
}
