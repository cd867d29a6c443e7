//! Persisted record types
//!
//! Data structures shared by the cache document and the key-store document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// A candidate bridge located by discovery.
///
/// Immutable once created. The address can go stale when the bridge is
/// re-addressed by DHCP; staleness is only ever observed as a connection
/// failure, never detected up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRecord {
    /// Bridge identifier as advertised by the bridge itself.
    pub id: String,

    /// IPv4/IPv6 literal on the local segment.
    #[serde(rename = "internalipaddress")]
    pub internal_address: String,

    /// HTTPS port, normally 443.
    #[serde(default = "default_bridge_port")]
    pub port: u16,
}

fn default_bridge_port() -> u16 {
    443
}

impl BridgeRecord {
    /// A record is usable when it carries an id and an address that parses
    /// as an IP literal. Discovery drops anything else before caching.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && self.internal_address.parse::<IpAddr>().is_ok()
    }

    /// `host:port` authority for URL construction, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        match self.internal_address.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("[{}]:{}", self.internal_address, self.port),
            _ => format!("{}:{}", self.internal_address, self.port),
        }
    }
}

/// The on-disk bridge/credential cache document.
///
/// Owned exclusively by [`BridgeStore`](crate::store::BridgeStore): loaded
/// once at startup, mutated under its lock, flushed after every mutation.
/// Every key in `credentials` referenced an id present in `records` at the
/// time it was written; `BridgeStore` enforces this on write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeCache {
    #[serde(default)]
    pub records: BTreeMap<String, BridgeRecord>,

    #[serde(default)]
    pub credentials: BTreeMap<String, String>,

    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

/// The credential issued at pairing time.
///
/// `application_key` is the working credential sent as the
/// `hue-application-key` header on every resource call. `client_key` is the
/// secondary key the pairing request asks the bridge to generate; it is
/// persisted but never used as the request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub application_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
}

impl StoredCredential {
    pub fn new(application_key: impl Into<String>) -> Self {
        Self {
            application_key: application_key.into(),
            client_key: None,
        }
    }
}
