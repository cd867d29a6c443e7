//! # Credential and Bridge-Cache Storage
//!
//! Persistence for the two documents the connectivity layer keeps on disk:
//! the bridge cache (discovered records, per-bridge application keys, the
//! discovery timestamp) and the key store (the single working credential).
//!
//! ## Guarantees
//!
//! - Every mutation persists before it is visible: the in-memory and on-disk
//!   views never diverge after a reported success
//! - Persistence failures surface to the caller, never logged-and-ignored
//! - Documents are single-line JSON with owner-only file permissions
//! - A credential is only accepted for a bridge id present in the cache

pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::{default_cache_path, default_key_path, BridgeStore, KeyStore};
pub use types::{BridgeCache, BridgeRecord, StoredCredential};
