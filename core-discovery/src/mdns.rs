//! Local Service Discovery
//!
//! Bridges advertise `_hue._tcp` on the local segment. Browsing is a
//! time-boxed listen-and-collect: mDNS has no "done" signal, so the browse
//! runs until its deadline and returns whatever resolved by then. An empty
//! result is a normal outcome on restrictive networks (VLANs, AP isolation),
//! not an error.

use crate::error::{DiscoveryError, Result};
use async_trait::async_trait;
use core_store::BridgeRecord;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use std::time::Duration;
use tracing::{debug, warn};

/// Service type bridges advertise on the local segment.
pub const BRIDGE_SERVICE_TYPE: &str = "_hue._tcp.local.";

/// TXT record key carrying the bridge id.
const BRIDGE_ID_PROPERTY: &str = "bridgeid";

/// Time-boxed enumeration of bridges on the local segment.
///
/// Trait seam so discovery logic can be exercised without multicast traffic;
/// [`MdnsBrowser`] is the production implementation.
#[async_trait]
pub trait LocalBrowser: Send + Sync {
    /// Collect every advertised bridge seen before `timeout` elapses.
    async fn browse(&self, timeout: Duration) -> Result<Vec<BridgeRecord>>;
}

/// mDNS browser on `mdns-sd`.
pub struct MdnsBrowser {
    service_type: String,
}

impl MdnsBrowser {
    pub fn new() -> Self {
        Self {
            service_type: BRIDGE_SERVICE_TYPE.to_string(),
        }
    }

    /// Browse a different service type (bridge emulators advertise their own).
    pub fn with_service_type(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
        }
    }
}

impl Default for MdnsBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalBrowser for MdnsBrowser {
    async fn browse(&self, timeout: Duration) -> Result<Vec<BridgeRecord>> {
        let daemon =
            ServiceDaemon::new().map_err(|e| DiscoveryError::Browse(e.to_string()))?;
        let receiver = daemon
            .browse(&self.service_type)
            .map_err(|e| DiscoveryError::Browse(e.to_string()))?;

        let deadline = tokio::time::Instant::now() + timeout;
        let mut records = Vec::new();

        loop {
            let event = match tokio::time::timeout_at(deadline, receiver.recv_async()).await {
                // Deadline reached: whatever accumulated is the result.
                Err(_) => break,
                // Daemon went away; treat like the deadline.
                Ok(Err(_)) => break,
                Ok(Ok(event)) => event,
            };

            if let ServiceEvent::ServiceResolved(info) = event {
                let id = info
                    .get_properties()
                    .get_property_val_str(BRIDGE_ID_PROPERTY)
                    .map(str::to_owned)
                    .unwrap_or_else(|| instance_label(info.get_fullname()));

                for address in info.get_addresses() {
                    debug!(
                        id = %id,
                        address = %address,
                        port = info.get_port(),
                        "Resolved bridge advertisement"
                    );
                    records.push(BridgeRecord {
                        id: id.clone(),
                        internal_address: address.to_string(),
                        port: info.get_port(),
                    });
                }
            }
        }

        if let Err(e) = daemon.stop_browse(&self.service_type) {
            warn!(error = %e, "Failed to stop mDNS browse");
        }
        let _ = daemon.shutdown();

        Ok(records)
    }
}

/// Instance label of an mDNS full name ("Hue Bridge._hue._tcp.local." ->
/// "Hue Bridge"), used when the advertisement carries no bridge id property.
fn instance_label(fullname: &str) -> String {
    fullname
        .split('.')
        .next()
        .unwrap_or(fullname)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_label() {
        assert_eq!(
            instance_label("Philips Hue - 8381F2._hue._tcp.local."),
            "Philips Hue - 8381F2"
        );
        assert_eq!(instance_label("bare"), "bare");
    }
}
