//! # Bridge Client Core
//!
//! Connectivity and session establishment for a local-network bridge:
//! pairing, credential resolution, the rate-limited fault-classified
//! transport, and the generic resource operations every typed manager is
//! built from.
//!
//! ## Overview
//!
//! - [`HubClient`] - client facade for one bridge, safe to share across tasks
//! - [`ClientBuilder`] - discovery- and cache-backed construction
//! - [`Transport`] - rate limiting, credential header, status classification
//! - [`pairing`] - the link-button registration protocol
//! - [`resources`] - generic GET/POST/PUT/DELETE helpers
//! - [`LightService`] / [`RoomService`] - typed resource managers
//!
//! ## Getting Connected
//!
//! ```ignore
//! use core_client::{ClientConfig, HubClient};
//! use hub_reqwest::ReqwestHttpClient;
//! use hub_traits::RequestContext;
//! use std::sync::Arc;
//!
//! let client = HubClient::new(
//!     ClientConfig::new("192.168.1.10"),
//!     Arc::new(ReqwestHttpClient::new()),
//! );
//!
//! let ctx = RequestContext::new();
//! client.initialize(&ctx).await?; // pairs when no credential resolves
//! let lights = client.lights().get_all_lights(&ctx).await?;
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod light;
pub mod limiter;
pub mod pairing;
pub mod resources;
pub mod room;
pub mod transport;

pub use client::{ClientBuilder, HubClient};
pub use config::{ClientConfig, CredentialSource, DEFAULT_CREDENTIAL_ENV_VAR};
pub use credentials::CredentialResolver;
pub use error::{ApiError, Result};
pub use light::{Light, LightService, LightUpdate};
pub use resources::{Identified, Reference, ResourceError, ResourceList};
pub use room::{Room, RoomCreate, RoomService, RoomUpdate};
pub use transport::{ConnectionState, Transport, APPLICATION_KEY_HEADER};
