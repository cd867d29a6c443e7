use core_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("local service browse failed: {0}")]
    Browse(String),

    #[error("cloud discovery request failed: {0}")]
    Cloud(String),

    #[error("cloud discovery returned a malformed payload: {0}")]
    Decode(String),

    #[error("discovery canceled")]
    Canceled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
