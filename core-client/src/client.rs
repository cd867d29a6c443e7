//! Client Facade and Cache-Backed Construction
//!
//! [`HubClient`] wires transport, credential resolution and the resource
//! services for one bridge. [`ClientBuilder`] layers discovery and the
//! bridge cache on top: find a bridge, pair against it, hand back a ready
//! client with its credential pinned from the cache.

use crate::config::ClientConfig;
use crate::credentials::CredentialResolver;
use crate::error::{ApiError, Result};
use crate::light::LightService;
use crate::pairing;
use crate::room::RoomService;
use crate::transport::{ConnectionState, Transport};
use core_discovery::{BridgeDiscovery, LocalBrowser};
use core_store::{BridgeRecord, BridgeStore};
use hub_traits::{HttpClient, RequestContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Client for one bridge.
///
/// Cheap to share: all state lives behind `Arc`s, and concurrent callers go
/// through the same rate limiter and credential resolution.
pub struct HubClient {
    transport: Arc<Transport>,
    resolver: CredentialResolver,
    lights: LightService,
    rooms: RoomService,
    app_name: String,
    instance_name: String,
}

impl std::fmt::Debug for HubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubClient")
            .field("app_name", &self.app_name)
            .field("instance_name", &self.instance_name)
            .finish_non_exhaustive()
    }
}

impl HubClient {
    /// Client with credential resolution taken from `config`.
    pub fn new(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        let resolver = CredentialResolver::from_config(&config);
        Self::with_resolver(config, http, resolver)
    }

    /// Client with an explicit resolver, for construction paths that own
    /// the credential themselves (cache-backed builds, tests).
    pub fn with_resolver(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        resolver: CredentialResolver,
    ) -> Self {
        let transport = Arc::new(Transport::new(
            http,
            config.base_url(),
            resolver.clone(),
            config.requests_per_second,
            config.timeout,
        ));

        Self {
            lights: LightService::new(Arc::clone(&transport)),
            rooms: RoomService::new(Arc::clone(&transport)),
            transport,
            resolver,
            app_name: config.app_name,
            instance_name: config.instance_name,
        }
    }

    /// Make sure the client holds a working credential, pairing when none
    /// resolves.
    ///
    /// The pairing path returns [`ApiError::LinkButtonNotPressed`] until the
    /// user presses the bridge's button; prompt and call again.
    pub async fn initialize(&self, ctx: &RequestContext) -> Result<()> {
        if self.transport.resolve_credential().await?.is_some() {
            debug!("Credential already available, skipping registration");
            return Ok(());
        }

        pairing::register_device(
            &self.transport,
            &self.resolver,
            ctx,
            &self.app_name,
            &self.instance_name,
        )
        .await?;
        Ok(())
    }

    /// The credential requests will carry right now.
    pub async fn active_credential(&self) -> Result<String> {
        self.transport
            .resolve_credential()
            .await?
            .ok_or(ApiError::CredentialNotFound)
    }

    pub fn lights(&self) -> &LightService {
        &self.lights
    }

    pub fn rooms(&self) -> &RoomService {
        &self.rooms
    }

    /// Pairing state of this instance.
    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// The underlying transport, for resource types this crate does not
    /// wrap.
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }
}

/// Builds clients out of the bridge cache.
pub struct ClientBuilder {
    store: Arc<BridgeStore>,
    http: Arc<dyn HttpClient>,
    discovery: BridgeDiscovery,
    app_name: String,
    instance_name: String,
    requests_per_second: f64,
    timeout: Duration,
}

impl ClientBuilder {
    pub fn new(
        store: Arc<BridgeStore>,
        http: Arc<dyn HttpClient>,
        browser: Arc<dyn LocalBrowser>,
    ) -> Self {
        let discovery =
            BridgeDiscovery::new(Arc::clone(&store), Arc::clone(&http), browser);
        let defaults = ClientConfig::new(String::new());
        Self {
            store,
            http,
            discovery,
            app_name: defaults.app_name,
            instance_name: defaults.instance_name,
            requests_per_second: defaults.requests_per_second,
            timeout: defaults.timeout,
        }
    }

    /// Identity sent as `devicetype` when this builder pairs.
    pub fn app_identity(
        mut self,
        app_name: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> Self {
        self.app_name = app_name.into();
        self.instance_name = instance_name.into();
        self
    }

    /// The discovery engine behind this builder, for callers that want the
    /// bridge list or a forced re-discovery.
    pub fn discovery(&self) -> &BridgeDiscovery {
        &self.discovery
    }

    /// Discover, pick the first cached bridge without a credential, pair
    /// against it, and return its id with a ready client.
    ///
    /// The issued key is persisted into the bridge cache before anything is
    /// returned.
    pub async fn client_for_new_bridge(&self, ctx: &RequestContext) -> Result<(String, HubClient)> {
        self.discovery.discover(ctx).await?;

        let bridge = self
            .store
            .find_unpaired()
            .await
            .ok_or(ApiError::NoUnpairedBridge)?;

        let pairing_client = self.client_with(&bridge, CredentialResolver::unauthenticated());
        let credential = pairing::request_registration(
            pairing_client.transport(),
            ctx,
            &self.app_name,
            &self.instance_name,
        )
        .await?;

        self.store
            .set_credential(&bridge.id, &credential.application_key)
            .await?;
        info!(bridge_id = %bridge.id, "Registered device with bridge");

        let client = self.client_with(
            &bridge,
            CredentialResolver::fixed(credential.application_key),
        );
        Ok((bridge.id.clone(), client))
    }

    /// Client for a bridge that paired earlier, from the cached record and
    /// key.
    pub async fn client_for_bridge(&self, bridge_id: &str) -> Result<HubClient> {
        let (bridge, key) = self.store.bridge_and_credential(bridge_id).await?;
        Ok(self.client_with(&bridge, CredentialResolver::fixed(key)))
    }

    fn client_with(&self, bridge: &BridgeRecord, resolver: CredentialResolver) -> HubClient {
        let mut config = ClientConfig::new(bridge.authority());
        config.app_name = self.app_name.clone();
        config.instance_name = self.instance_name.clone();
        config.requests_per_second = self.requests_per_second;
        config.timeout = self.timeout;
        HubClient::with_resolver(config, Arc::clone(&self.http), resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSource;
    use crate::transport::APPLICATION_KEY_HEADER;
    use async_trait::async_trait;
    use bytes::Bytes;
    use core_discovery::DiscoveryError;
    use hub_traits::{HttpRequest, HttpResponse};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(
                &self,
                request: HttpRequest,
            ) -> hub_traits::Result<HttpResponse>;
        }
    }

    mock! {
        Browser {}

        #[async_trait]
        impl LocalBrowser for Browser {
            async fn browse(
                &self,
                timeout: Duration,
            ) -> core_discovery::Result<Vec<BridgeRecord>>;
        }
    }

    fn json_response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.as_bytes().to_vec()),
        }
    }

    fn record(id: &str, address: &str) -> BridgeRecord {
        BridgeRecord {
            id: id.to_string(),
            internal_address: address.to_string(),
            port: 443,
        }
    }

    async fn seeded_store(records: &[BridgeRecord]) -> Arc<BridgeStore> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge_cache.json");
        std::mem::forget(dir);
        let store = BridgeStore::load(path).await.unwrap();
        store.merge_records(records).await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_initialize_skips_pairing_with_credential() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let config = ClientConfig::new("192.168.1.10");
        let client = HubClient::with_resolver(
            config,
            Arc::new(http),
            CredentialResolver::fixed("existing"),
        );

        client.initialize(&RequestContext::new()).await.unwrap();
        assert_eq!(client.state(), ConnectionState::Paired);
        assert_eq!(client.active_credential().await.unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_initialize_pairs_when_no_credential() {
        let dir = tempfile::tempdir().unwrap();

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|request| {
            assert!(request.url.ends_with("/api"));
            Ok(json_response(
                r#"[{"success":{"username":"u1","clientkey":"k1"}}]"#,
            ))
        });

        let mut config = ClientConfig::new("192.168.1.10");
        config.credential_source = CredentialSource::DiskOnly;
        config.key_store_path = Some(dir.path().join("hue-keys.json"));

        let client = HubClient::new(config, Arc::new(http));
        client.initialize(&RequestContext::new()).await.unwrap();

        assert_eq!(client.state(), ConnectionState::Paired);
        assert_eq!(client.active_credential().await.unwrap(), "u1");
    }

    #[tokio::test]
    async fn test_missing_credential_is_distinct() {
        let http = MockHttpClient::new();
        let config = ClientConfig::new("192.168.1.10");
        let client = HubClient::with_resolver(
            config,
            Arc::new(http),
            CredentialResolver::unauthenticated(),
        );

        let err = client.active_credential().await.unwrap_err();
        assert!(matches!(err, ApiError::CredentialNotFound));
    }

    #[tokio::test]
    async fn test_builder_pairs_new_bridge_and_persists_key() {
        let store = seeded_store(&[record("abc", "192.168.1.10")]).await;

        let mut http = MockHttpClient::new();
        let mut calls = 0;
        http.expect_execute().times(2).returning_st(move |request| {
            calls += 1;
            if calls == 1 {
                // Registration goes out unauthenticated.
                assert!(request.url.ends_with("/api"));
                assert!(!request.headers.contains_key(APPLICATION_KEY_HEADER));
                Ok(json_response(
                    r#"[{"success":{"username":"u1","clientkey":"k1"}}]"#,
                ))
            } else {
                assert_eq!(
                    request.headers.get(APPLICATION_KEY_HEADER),
                    Some(&"u1".to_string())
                );
                Ok(json_response(r#"{"data":[],"errors":[]}"#))
            }
        });

        // Cache is fresh, so the browser must never run.
        let browser = MockBrowser::new();

        let builder = ClientBuilder::new(store.clone(), Arc::new(http), Arc::new(browser));
        let ctx = RequestContext::new();

        let (bridge_id, client) = builder
            .client_for_new_bridge(&ctx)
            .await
            .expect("pairing failed");
        assert_eq!(bridge_id, "abc");

        // The key was persisted before the client came back.
        assert_eq!(store.credential("abc").await.unwrap(), "u1");

        // And the ready client authenticates with it.
        client.lights().get_all_lights(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_builder_link_button_error_passes_through() {
        let store = seeded_store(&[record("abc", "192.168.1.10")]).await;

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                r#"[{"error":{"type":101,"address":"","description":"link button not pressed"}}]"#,
            ))
        });

        let builder =
            ClientBuilder::new(store.clone(), Arc::new(http), Arc::new(MockBrowser::new()));

        let err = builder
            .client_for_new_bridge(&RequestContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::LinkButtonNotPressed));

        // Nothing was persisted for the failed attempt.
        assert!(store.credential("abc").await.is_err());
    }

    #[tokio::test]
    async fn test_builder_reports_when_all_bridges_are_paired() {
        let store = seeded_store(&[record("abc", "192.168.1.10")]).await;
        store.set_credential("abc", "u1").await.unwrap();

        let http = MockHttpClient::new();
        let builder =
            ClientBuilder::new(store, Arc::new(http), Arc::new(MockBrowser::new()));

        let err = builder
            .client_for_new_bridge(&RequestContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoUnpairedBridge));
    }

    #[tokio::test]
    async fn test_builder_client_for_known_bridge() {
        let store = seeded_store(&[record("abc", "192.168.1.10")]).await;
        store.set_credential("abc", "u1").await.unwrap();

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|request| {
            assert!(request.url.starts_with("https://192.168.1.10:443/"));
            assert_eq!(
                request.headers.get(APPLICATION_KEY_HEADER),
                Some(&"u1".to_string())
            );
            Ok(json_response(r#"{"data":[],"errors":[]}"#))
        });

        let builder =
            ClientBuilder::new(store, Arc::new(http), Arc::new(MockBrowser::new()));

        let client = builder.client_for_bridge("abc").await.unwrap();
        client
            .lights()
            .get_all_lights(&RequestContext::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_builder_unknown_bridge() {
        let store = seeded_store(&[]).await;
        let builder = ClientBuilder::new(
            store,
            Arc::new(MockHttpClient::new()),
            Arc::new(MockBrowser::new()),
        );

        let err = builder.client_for_bridge("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Store(core_store::StoreError::UnknownBridge { .. })
        ));
    }

    #[tokio::test]
    async fn test_builder_surfaces_discovery_failure() {
        // Empty, stale cache; browse finds nothing; cloud fails.
        let store = seeded_store(&[]).await;

        let mut browser = MockBrowser::new();
        browser.expect_browse().times(1).returning(|_| Ok(vec![]));

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            Err(hub_traits::HubError::OperationFailed(
                "Connection failed".to_string(),
            ))
        });

        let builder = ClientBuilder::new(store, Arc::new(http), Arc::new(browser));

        let err = builder
            .client_for_new_bridge(&RequestContext::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Discovery(DiscoveryError::Cloud(_))
        ));
    }
}
