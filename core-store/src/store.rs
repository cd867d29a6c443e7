//! Credential and Bridge-Cache Persistence
//!
//! Two small JSON documents back the connectivity layer:
//!
//! - the bridge cache ([`BridgeStore`]): discovered bridge records, per-bridge
//!   application keys, and the discovery timestamp
//! - the key store ([`KeyStore`]): the single working credential used by
//!   clients constructed against a fixed address
//!
//! Both follow the same discipline: every mutation is read-modify-write-persist
//! under one lock, the write to disk completes (or fails) before the lock
//! releases, and a failed write is surfaced to the caller with the in-memory
//! state left untouched. Callers observe the pre- or post-update state, never
//! a torn one, and a reported success is always on disk.

use crate::error::{Result, StoreError};
use crate::types::{BridgeCache, BridgeRecord, StoredCredential};
use chrono::Utc;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "hue-client-core";
const CACHE_FILE: &str = "bridge_cache.json";
const KEY_FILE: &str = "hue-keys.json";

/// Default location of the bridge cache document.
pub fn default_cache_path() -> PathBuf {
    config_dir().join(CACHE_FILE)
}

/// Default location of the key-store document.
pub fn default_key_path() -> PathBuf {
    config_dir().join(KEY_FILE)
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Serialize `value` and write it to `path` as a single-line JSON document
/// with owner-only permissions, creating parent directories on demand.
async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let data = serde_json::to_vec(value)?;
    tokio::fs::write(path, &data).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}

/// Disk-backed store for discovered bridges and their application keys.
///
/// Loaded once at process start; all later access goes through the in-memory
/// copy under a single lock. There is no ambient singleton — owners pass the
/// store where it is needed.
pub struct BridgeStore {
    path: PathBuf,
    state: Mutex<BridgeCache>,
}

impl BridgeStore {
    /// Load the cache document at `path`, starting empty when the file does
    /// not exist yet. A document that no longer parses is discarded with a
    /// warning: the cache is reconstructible through discovery and pairing.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = match tokio::fs::read(&path).await {
            Ok(data) => match serde_json::from_slice::<BridgeCache>(&data) {
                Ok(cache) => {
                    debug!(
                        path = %path.display(),
                        records = cache.records.len(),
                        "Loaded bridge cache"
                    );
                    cache
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Bridge cache does not parse, starting empty"
                    );
                    BridgeCache::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No bridge cache on disk yet");
                BridgeCache::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(cache),
        })
    }

    /// Load the cache from its default location.
    pub async fn load_default() -> Result<Self> {
        Self::load(default_cache_path()).await
    }

    /// All cached bridge records.
    pub async fn records(&self) -> Vec<BridgeRecord> {
        let state = self.state.lock().await;
        state.records.values().cloned().collect()
    }

    /// Cached records, but only while the last discovery is younger than
    /// `window`. Returns `None` when the cache is empty or stale.
    pub async fn fresh_records(&self, window: Duration) -> Option<Vec<BridgeRecord>> {
        let state = self.state.lock().await;
        let fetched_at = state.fetched_at?;
        let age = Utc::now().signed_duration_since(fetched_at).to_std().ok()?;
        if age < window && !state.records.is_empty() {
            Some(state.records.values().cloned().collect())
        } else {
            None
        }
    }

    /// Merge freshly discovered records into the cache by id and stamp the
    /// discovery time. Merging (rather than replacing) keeps previously
    /// paired bridges that are not currently advertising.
    pub async fn merge_records(&self, records: &[BridgeRecord]) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        for record in records {
            next.records.insert(record.id.clone(), record.clone());
        }
        next.fetched_at = Some(Utc::now());

        write_document(&self.path, &next).await?;
        *state = next;

        debug!(records = state.records.len(), "Bridge cache updated");
        Ok(())
    }

    /// Application key for `bridge_id`.
    pub async fn credential(&self, bridge_id: &str) -> Result<String> {
        let state = self.state.lock().await;
        state
            .credentials
            .get(bridge_id)
            .cloned()
            .ok_or_else(|| StoreError::CredentialNotFound {
                bridge_id: bridge_id.to_string(),
            })
    }

    /// Store the application key issued for `bridge_id`.
    ///
    /// The id must reference a cached record: a credential for a bridge the
    /// cache has never seen cannot be resolved back to an address later.
    pub async fn set_credential(&self, bridge_id: &str, application_key: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.records.contains_key(bridge_id) {
            return Err(StoreError::UnknownBridge {
                bridge_id: bridge_id.to_string(),
            });
        }

        let mut next = state.clone();
        next.credentials
            .insert(bridge_id.to_string(), application_key.to_string());

        write_document(&self.path, &next).await?;
        *state = next;

        info!(bridge_id = bridge_id, "Stored bridge credential");
        Ok(())
    }

    /// Record and key for `bridge_id`, for constructing a ready client.
    pub async fn bridge_and_credential(&self, bridge_id: &str) -> Result<(BridgeRecord, String)> {
        let state = self.state.lock().await;
        let record = state
            .records
            .get(bridge_id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownBridge {
                bridge_id: bridge_id.to_string(),
            })?;
        let key = state
            .credentials
            .get(bridge_id)
            .cloned()
            .ok_or_else(|| StoreError::CredentialNotFound {
                bridge_id: bridge_id.to_string(),
            })?;
        Ok((record, key))
    }

    /// First cached bridge without a stored credential, if any.
    ///
    /// Deterministic: records iterate in id order.
    pub async fn find_unpaired(&self) -> Option<BridgeRecord> {
        let state = self.state.lock().await;
        state
            .records
            .values()
            .find(|record| !state.credentials.contains_key(&record.id))
            .cloned()
    }
}

/// Disk-backed store for the single working credential.
///
/// Unlike [`BridgeStore`] this reads the document on every access: the file
/// is tiny, and rereading lets an operator rotate the key on disk without
/// restarting the process. The lock serializes read-modify-write cycles.
pub struct KeyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Key store at its default location.
    pub fn at_default_location() -> Self {
        Self::new(default_key_path())
    }

    /// The stored credential.
    ///
    /// `KeyNotFound` when no credential has been stored yet — the expected
    /// state on first run, before pairing.
    pub async fn get(&self) -> Result<StoredCredential> {
        let _guard = self.lock.lock().await;
        self.read().await?.ok_or(StoreError::KeyNotFound)
    }

    /// Persist `credential`, replacing any previous one.
    pub async fn set(&self, credential: &StoredCredential) -> Result<()> {
        let _guard = self.lock.lock().await;
        write_document(&self.path, credential).await?;
        info!("Stored application key");
        Ok(())
    }

    async fn read(&self) -> Result<Option<StoredCredential>> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| StoreError::Corrupted(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
