//! Error types for the chunkseek index and query engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated input: varint runs past the end of the buffer")]
    TruncatedInput,

    #[error("Varint overflow: more than 64 bits of payload")]
    VarintOverflow,

    #[error("Data corruption: {0}")]
    Corruption(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Chunk id {0} out of range (max 99999)")]
    ChunkIdOutOfRange(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    /// Shorthand for a corruption error with a formatted message.
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        IndexError::Corruption(msg.into())
    }
}
