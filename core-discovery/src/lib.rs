//! # Bridge Discovery
//!
//! Finds bridges on the local network with a primary/fallback strategy:
//!
//! 1. A cached result inside its freshness window answers without network I/O
//! 2. A time-boxed mDNS browse of `_hue._tcp` collects whatever advertises
//!    before the deadline (an empty result is normal, not an error)
//! 3. Only an empty local browse falls back to one GET against the cloud
//!    discovery endpoint; failure there is terminal
//!
//! Results merge into the shared [`BridgeStore`](core_store::BridgeStore) by
//! id, so bridges that paired earlier but are not currently advertising stay
//! known.

pub mod discovery;
pub mod error;
pub mod mdns;

pub use discovery::{BridgeDiscovery, DiscoveryConfig, CLOUD_DISCOVERY_URL};
pub use error::{DiscoveryError, Result};
pub use mdns::{LocalBrowser, MdnsBrowser, BRIDGE_SERVICE_TYPE};
