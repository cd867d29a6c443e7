//! Bridge Discovery
//!
//! Primary/fallback location of bridges: a cached result inside its
//! freshness window short-circuits all network I/O; otherwise a time-boxed
//! local browse runs first, and only when that comes back empty does a
//! single round trip to the cloud discovery endpoint happen. Results merge
//! into the cache by id so previously paired bridges survive windows where
//! they are not advertising.

use crate::error::{DiscoveryError, Result};
use crate::mdns::LocalBrowser;
use core_store::{BridgeRecord, BridgeStore};
use hub_traits::{HttpClient, HttpMethod, HttpRequest, RequestContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Fixed cloud discovery endpoint.
pub const CLOUD_DISCOVERY_URL: &str = "https://discovery.meethue.com";

/// Tuning knobs for [`BridgeDiscovery`].
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// How long a cached discovery result stays authoritative.
    pub freshness_window: Duration,
    /// Deadline for the local service browse.
    pub browse_timeout: Duration,
    /// Cloud fallback endpoint returning the JSON bridge array.
    pub discovery_url: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(3600),
            browse_timeout: Duration::from_secs(5),
            discovery_url: CLOUD_DISCOVERY_URL.to_string(),
        }
    }
}

/// Locates bridges and keeps the shared cache current.
pub struct BridgeDiscovery {
    store: Arc<BridgeStore>,
    http: Arc<dyn HttpClient>,
    browser: Arc<dyn LocalBrowser>,
    config: DiscoveryConfig,
}

impl BridgeDiscovery {
    pub fn new(
        store: Arc<BridgeStore>,
        http: Arc<dyn HttpClient>,
        browser: Arc<dyn LocalBrowser>,
    ) -> Self {
        Self::with_config(store, http, browser, DiscoveryConfig::default())
    }

    pub fn with_config(
        store: Arc<BridgeStore>,
        http: Arc<dyn HttpClient>,
        browser: Arc<dyn LocalBrowser>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            http,
            browser,
            config,
        }
    }

    /// All known bridges, served from the cache when it is fresh.
    ///
    /// Fails only when both discovery paths fail; an empty local browse is
    /// not a failure, it triggers the cloud fallback.
    #[instrument(skip(self, ctx))]
    pub async fn discover(&self, ctx: &RequestContext) -> Result<Vec<BridgeRecord>> {
        if let Some(records) = self.store.fresh_records(self.config.freshness_window).await {
            debug!(count = records.len(), "Serving bridge records from cache");
            return Ok(records);
        }
        self.discover_fresh(ctx).await
    }

    /// Run the full discovery sequence regardless of cache freshness.
    ///
    /// The escape hatch for callers that hit a stale cached address: cached
    /// records are never re-validated on use, so a connection failure against
    /// one is the signal to force re-discovery here.
    #[instrument(skip(self, ctx))]
    pub async fn discover_fresh(&self, ctx: &RequestContext) -> Result<Vec<BridgeRecord>> {
        let found = tokio::select! {
            biased;
            _ = ctx.canceled() => return Err(DiscoveryError::Canceled),
            result = self.browser.browse(self.config.browse_timeout) => match result {
                Ok(records) => records,
                Err(e) => {
                    // Browse trouble degrades to "nothing seen locally";
                    // the cloud fallback still gets its chance.
                    warn!(error = %e, "Local browse failed");
                    Vec::new()
                }
            },
        };

        let found = retain_valid(found);

        let records = if found.is_empty() {
            debug!("Local browse returned nothing, falling back to cloud discovery");
            retain_valid(self.cloud_lookup(ctx).await?)
        } else {
            info!(count = found.len(), "Found bridges via local browse");
            found
        };

        self.store.merge_records(&records).await?;
        Ok(self.store.records().await)
    }

    /// Single GET against the cloud discovery endpoint. Network or decode
    /// failure here is terminal: it only runs when the local path found
    /// nothing, so there is no third option.
    async fn cloud_lookup(&self, ctx: &RequestContext) -> Result<Vec<BridgeRecord>> {
        let request = HttpRequest::new(HttpMethod::Get, self.config.discovery_url.clone())
            .header("Accept", "application/json");

        let response = tokio::select! {
            biased;
            _ = ctx.canceled() => return Err(DiscoveryError::Canceled),
            result = self.http.execute(request) => {
                result.map_err(|e| DiscoveryError::Cloud(e.to_string()))?
            }
        };

        if !response.is_success() {
            return Err(DiscoveryError::Cloud(format!(
                "endpoint answered with status {}",
                response.status
            )));
        }

        let records: Vec<BridgeRecord> = serde_json::from_slice(&response.body)
            .map_err(|e| DiscoveryError::Decode(e.to_string()))?;

        info!(count = records.len(), "Found bridges via cloud discovery");
        Ok(records)
    }
}

/// Drop records that would be useless later: no id, or an address that is
/// not an IP literal.
fn retain_valid(records: Vec<BridgeRecord>) -> Vec<BridgeRecord> {
    records
        .into_iter()
        .filter(|record| {
            let valid = record.is_valid();
            if !valid {
                warn!(
                    id = %record.id,
                    address = %record.internal_address,
                    "Discarding unusable bridge record"
                );
            }
            valid
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(
                &self,
                request: HttpRequest,
            ) -> hub_traits::Result<hub_traits::HttpResponse>;
        }
    }

    mock! {
        Browser {}

        #[async_trait]
        impl LocalBrowser for Browser {
            async fn browse(&self, timeout: Duration) -> Result<Vec<BridgeRecord>>;
        }
    }

    fn record(id: &str, address: &str) -> BridgeRecord {
        BridgeRecord {
            id: id.to_string(),
            internal_address: address.to_string(),
            port: 443,
        }
    }

    async fn empty_store() -> Arc<BridgeStore> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge_cache.json");
        // Keep the directory alive for the duration of the test process.
        std::mem::forget(dir);
        Arc::new(BridgeStore::load(path).await.unwrap())
    }

    fn json_response(body: &str) -> hub_traits::HttpResponse {
        hub_traits::HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.as_bytes().to_vec()),
        }
    }

    #[tokio::test]
    async fn test_local_browse_results_are_cached() {
        let mut browser = MockBrowser::new();
        browser
            .expect_browse()
            .times(1)
            .returning(|_| Ok(vec![record("abc", "192.168.1.10")]));

        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));
        let ctx = RequestContext::new();

        let first = discovery.discover(&ctx).await.expect("discovery failed");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "abc");

        // Second call inside the freshness window: identical records, and the
        // browse mock's times(1) proves no second network sequence ran.
        let second = discovery.discover(&ctx).await.expect("discovery failed");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_empty_browse_falls_back_to_cloud() {
        let mut browser = MockBrowser::new();
        browser.expect_browse().times(1).returning(|_| Ok(vec![]));

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|request| {
            assert_eq!(request.url, CLOUD_DISCOVERY_URL);
            Ok(json_response(
                r#"[{"id":"cloud1","internalipaddress":"192.168.1.20","port":443}]"#,
            ))
        });

        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));

        let records = discovery
            .discover(&RequestContext::new())
            .await
            .expect("discovery failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "cloud1");
    }

    #[tokio::test]
    async fn test_browse_error_still_tries_cloud() {
        let mut browser = MockBrowser::new();
        browser
            .expect_browse()
            .times(1)
            .returning(|_| Err(DiscoveryError::Browse("no multicast".to_string())));

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                r#"[{"id":"cloud1","internalipaddress":"192.168.1.20","port":443}]"#,
            ))
        });

        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));

        let records = discovery
            .discover(&RequestContext::new())
            .await
            .expect("discovery failed");
        assert_eq!(records[0].id, "cloud1");
    }

    #[tokio::test]
    async fn test_both_paths_failing_is_terminal() {
        let mut browser = MockBrowser::new();
        browser.expect_browse().times(1).returning(|_| Ok(vec![]));

        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            Err(hub_traits::HubError::OperationFailed(
                "Connection failed".to_string(),
            ))
        });

        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));

        let err = discovery
            .discover(&RequestContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Cloud(_)));
    }

    #[tokio::test]
    async fn test_malformed_cloud_payload_is_terminal() {
        let mut browser = MockBrowser::new();
        browser.expect_browse().times(1).returning(|_| Ok(vec![]));

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response("not json")));

        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));

        let err = discovery
            .discover(&RequestContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unusable_records_are_discarded() {
        let mut browser = MockBrowser::new();
        browser.expect_browse().times(1).returning(|_| {
            Ok(vec![
                record("abc", "192.168.1.10"),
                record("", "192.168.1.11"),
                record("def", "not-an-address"),
            ])
        });

        let http = MockHttpClient::new();
        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));

        let records = discovery
            .discover(&RequestContext::new())
            .await
            .expect("discovery failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "abc");
        assert!(records[0].internal_address.parse::<std::net::IpAddr>().is_ok());
    }

    #[tokio::test]
    async fn test_discover_fresh_bypasses_window() {
        let mut browser = MockBrowser::new();
        browser
            .expect_browse()
            .times(2)
            .returning(|_| Ok(vec![record("abc", "192.168.1.10")]));

        let http = MockHttpClient::new();
        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));
        let ctx = RequestContext::new();

        discovery.discover(&ctx).await.unwrap();
        discovery.discover_fresh(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_merge_keeps_previously_known_bridges() {
        let mut browser = MockBrowser::new();
        let mut calls = 0;
        browser.expect_browse().times(2).returning_st(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![record("old", "192.168.1.10")])
            } else {
                Ok(vec![record("new", "192.168.1.20")])
            }
        });

        let http = MockHttpClient::new();
        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));
        let ctx = RequestContext::new();

        discovery.discover(&ctx).await.unwrap();
        let records = discovery.discover_fresh(&ctx).await.unwrap();

        let mut ids: Vec<String> = records.into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["new".to_string(), "old".to_string()]);
    }

    #[tokio::test]
    async fn test_canceled_context_aborts_discovery() {
        let browser = MockBrowser::new();
        let http = MockHttpClient::new();

        let discovery =
            BridgeDiscovery::new(empty_store().await, Arc::new(http), Arc::new(browser));

        let ctx = RequestContext::new();
        ctx.cancel();

        let err = discovery.discover(&ctx).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Canceled));
    }
}
