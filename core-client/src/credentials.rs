//! Credential Resolution
//!
//! Resolves the active application key at request time according to the
//! strategy fixed at construction. Resolution is repeated per request, so a
//! key stored by pairing (or rotated on disk) is picked up without
//! rebuilding the client.

use crate::config::{ClientConfig, CredentialSource};
use crate::error::ApiError;
use core_store::{KeyStore, StoreError, StoredCredential};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
enum Inner {
    Env { var: String },
    EnvThenDisk { var: String, store: Arc<KeyStore> },
    Disk { store: Arc<KeyStore> },
    /// Pinned key, used by cache-backed construction where the credential
    /// is owned by the bridge store rather than the key store.
    Fixed { key: String },
    /// Never resolves; registration traffic goes out unauthenticated.
    Unauthenticated,
}

/// Resolves and persists the working credential for one client instance.
#[derive(Clone)]
pub struct CredentialResolver {
    inner: Inner,
}

impl CredentialResolver {
    pub fn from_config(config: &ClientConfig) -> Self {
        let key_store = || {
            Arc::new(match &config.key_store_path {
                Some(path) => KeyStore::new(path),
                None => KeyStore::at_default_location(),
            })
        };

        let inner = match config.credential_source {
            CredentialSource::EnvOnly => Inner::Env {
                var: config.env_var.clone(),
            },
            CredentialSource::EnvThenDisk => Inner::EnvThenDisk {
                var: config.env_var.clone(),
                store: key_store(),
            },
            CredentialSource::DiskOnly => Inner::Disk { store: key_store() },
        };

        Self { inner }
    }

    /// Resolver that always yields `key`.
    pub fn fixed(key: impl Into<String>) -> Self {
        Self {
            inner: Inner::Fixed { key: key.into() },
        }
    }

    /// Resolver that never yields a credential.
    pub fn unauthenticated() -> Self {
        Self {
            inner: Inner::Unauthenticated,
        }
    }

    /// The active credential, or `None` when the mode cannot produce one
    /// (unset variable, key store without a document). `None` is the
    /// not-yet-paired state, not an error.
    pub async fn resolve(&self) -> Result<Option<String>, StoreError> {
        match &self.inner {
            Inner::Env { var } => Ok(env_lookup(var)),
            Inner::EnvThenDisk { var, store } => match env_lookup(var) {
                Some(key) => Ok(Some(key)),
                None => disk_lookup(store).await,
            },
            Inner::Disk { store } => disk_lookup(store).await,
            Inner::Fixed { key } => Ok(Some(key.clone())),
            Inner::Unauthenticated => Ok(None),
        }
    }

    /// Persist a freshly issued credential.
    ///
    /// Only the disk-backed modes can do this; the others have nowhere to
    /// put it and refuse rather than pretend.
    pub async fn store(&self, credential: &StoredCredential) -> Result<(), ApiError> {
        match &self.inner {
            Inner::EnvThenDisk { store, .. } | Inner::Disk { store } => {
                store.set(credential).await?;
                Ok(())
            }
            Inner::Env { .. } => Err(ApiError::Config(
                "credential store is disabled in env-only mode".to_string(),
            )),
            Inner::Fixed { .. } | Inner::Unauthenticated => Err(ApiError::Config(
                "this client cannot persist a credential".to_string(),
            )),
        }
    }
}

fn env_lookup(var: &str) -> Option<String> {
    let value = std::env::var(var).ok().filter(|v| !v.is_empty());
    if value.is_some() {
        debug!(var = var, "Resolved credential from environment");
    }
    value
}

async fn disk_lookup(store: &KeyStore) -> Result<Option<String>, StoreError> {
    match store.get().await {
        Ok(credential) => Ok(Some(credential.application_key)),
        Err(StoreError::KeyNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}
