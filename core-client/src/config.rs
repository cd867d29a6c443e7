//! Client Configuration
//!
//! One explicit configuration struct with an enumerated credential
//! resolution strategy. Interactive/first-use flows read the key from disk;
//! server/CI flows inject it through the environment; both work without
//! code changes by picking a [`CredentialSource`].

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted by the env-backed resolution modes.
pub const DEFAULT_CREDENTIAL_ENV_VAR: &str = "HUE_APPLICATION_KEY";

/// Where the active credential is resolved from at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Environment variable only; the on-disk key store is never touched.
    EnvOnly,
    /// Environment variable when set, the on-disk key store otherwise.
    EnvThenDisk,
    /// On-disk key store only.
    DiskOnly,
}

/// Configuration for a [`HubClient`](crate::client::HubClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bridge host, `host` or `host:port`.
    pub address: String,

    /// Credential resolution strategy, fixed at construction.
    pub credential_source: CredentialSource,

    /// Environment variable supplying the credential in env-backed modes.
    pub env_var: String,

    /// Key-store document location; `None` uses the default path. Ignored
    /// in [`CredentialSource::EnvOnly`].
    pub key_store_path: Option<PathBuf>,

    /// Steady request rate shared across all calls of the instance
    /// (burst of 1). Non-positive disables limiting.
    pub requests_per_second: f64,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Accept the bridge's self-signed certificate. Deliberate trust
    /// decision for local-segment traffic; disable when the bridge presents
    /// a verifiable certificate.
    pub accept_invalid_certs: bool,

    /// Application name sent as the `devicetype` prefix during pairing.
    pub app_name: String,

    /// Instance name sent as the `devicetype` suffix during pairing.
    pub instance_name: String,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credential_source: CredentialSource::EnvThenDisk,
            env_var: DEFAULT_CREDENTIAL_ENV_VAR.to_string(),
            key_store_path: None,
            requests_per_second: 10.0,
            timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
            app_name: "hue-client-core".to_string(),
            instance_name: "default".to_string(),
        }
    }

    /// Base URL for API calls. Bridges only speak HTTPS.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.address)
    }
}
