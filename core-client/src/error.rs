//! Error types for the bridge client

use core_discovery::DiscoveryError;
use core_store::StoreError;
use hub_traits::HubError;
use thiserror::Error;

/// Bridge client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bridge rejected the credential (403). The client never re-pairs on
    /// its own; whether to run registration again is the caller's decision.
    #[error("bridge rejected the request: unauthorized")]
    Unauthorized,

    /// Resource does not exist (404), or the bridge answered with a
    /// different entity than the one requested.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Bridge is up but refusing service (503).
    #[error("bridge service unavailable")]
    ServiceUnavailable,

    /// Response body did not match the documented shape.
    #[error("malformed bridge response: {0}")]
    BadResponse(String),

    /// The request context was canceled or timed out before completion.
    #[error("request canceled")]
    Canceled,

    /// No credential resolvable under the configured mode. Expected on
    /// first run, before pairing.
    #[error("no credential available")]
    CredentialNotFound,

    /// Pairing precondition not met; retryable once the user presses the
    /// bridge's link button.
    #[error("link button not pressed")]
    LinkButtonNotPressed,

    /// Pairing rejected for any other reason.
    #[error("device registration failed: {0}")]
    RegistrationFailed(String),

    /// The bridge reported a business-logic failure inside a 2xx response.
    #[error("resource operation failed: {0}")]
    ResourceFailed(String),

    /// Every cached bridge already has a credential.
    #[error("no cached bridge without a credential")]
    NoUnpairedBridge,

    /// Client construction was asked for something its mode cannot do.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Transport(HubError),
}

impl From<HubError> for ApiError {
    fn from(error: HubError) -> Self {
        match error {
            HubError::Canceled => ApiError::Canceled,
            other => ApiError::Transport(other),
        }
    }
}

/// Result type for bridge client operations
pub type Result<T> = std::result::Result<T, ApiError>;
