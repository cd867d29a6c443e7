use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("request failed: {0}")]
    OperationFailed(String),

    #[error("request canceled")]
    Canceled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HubError>;
