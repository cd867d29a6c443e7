use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no credential stored for bridge {bridge_id}")]
    CredentialNotFound { bridge_id: String },

    #[error("no application key stored")]
    KeyNotFound,

    #[error("bridge {bridge_id} is not present in the cache")]
    UnknownBridge { bridge_id: String },

    #[error("store document corrupted: {0}")]
    Corrupted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
