use crate::ContentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Address of the actor whose state carries the network name.
pub const INIT_ACTOR_ADDRESS: &str = "f01";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub miner: String,
    pub parents: Vec<ContentId>,
    pub height: u64,
    pub parent_state_root: ContentId,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateRoot {
    pub version: u64,
    pub actors: BTreeMap<String, ActorState>,
}

impl StateRoot {
    pub fn actor(&self, address: &str) -> Option<&ActorState> {
        self.actors.get(address)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorState {
    pub code: String,
    pub head: ContentId,
    pub nonce: u64,
    pub balance: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitState {
    pub network_name: String,
    pub next_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub version: u64,
    pub to: String,
    pub from: String,
    pub nonce: u64,
    pub value: String,
    pub gas_limit: i64,
    pub method: u64,
    pub params: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message: Message,
    pub signature: Vec<u8>,
}
