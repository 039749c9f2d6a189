use crate::ContentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainwireError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid peer ID: {0}")]
    InvalidPeerId(String),

    #[error("Invalid connection watermarks: low ({low}) must not exceed high ({high})")]
    InvalidWatermarks { low: u32, high: u32 },

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Genesis block {0} not found")]
    GenesisNotFound(ContentId),

    #[error("Object {0} not found")]
    ObjectNotFound(ContentId),

    #[error("State error: {0}")]
    State(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Duplicate content IDs in fetch request")]
    DuplicateRequest,

    #[error("Failed to fetch {missing} blocks for unknown reasons")]
    FetchIncomplete { missing: usize },

    #[error("Context cancelled")]
    Cancelled,

    #[error("Context deadline exceeded")]
    DeadlineExceeded,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChainwireError {
    /// True for errors produced by a cancelled or expired context.
    pub fn is_context_error(&self) -> bool {
        matches!(self, ChainwireError::Cancelled | ChainwireError::DeadlineExceeded)
    }
}

pub type ChainwireResult<T> = Result<T, ChainwireError>;
