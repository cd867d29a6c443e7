//! Rate-Limited Bridge Transport
//!
//! Every API call funnels through here: acquire a rate-limit slot, resolve
//! and attach the credential header, execute through the [`HttpClient`]
//! seam, and classify the status code before anyone touches the body.
//!
//! Classification is deliberately narrow — 403, 404 and 503 are the only
//! statuses with a uniform meaning across the bridge API. Everything else,
//! including unclassified 4xx/5xx, passes through raw for the caller to
//! interpret.

use crate::credentials::CredentialResolver;
use crate::error::{ApiError, Result};
use crate::limiter::RateLimiter;
use hub_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RequestContext};
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Header carrying the application key on every resource call.
pub const APPLICATION_KEY_HEADER: &str = "hue-application-key";

/// Pairing lifecycle of one client instance.
///
/// `Unpaired → Paired` on the first successful credential resolution;
/// `→ Unauthorized` on any 403; back to `Paired` only when a credential is
/// freshly stored. The transport never re-pairs on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unpaired,
    Paired,
    Unauthorized,
}

const STATE_UNPAIRED: u8 = 0;
const STATE_PAIRED: u8 = 1;
const STATE_UNAUTHORIZED: u8 = 2;

/// Shared HTTP executor for one bridge.
pub struct Transport {
    http: Arc<dyn HttpClient>,
    base_url: String,
    resolver: CredentialResolver,
    limiter: RateLimiter,
    timeout: Duration,
    state: AtomicU8,
}

impl Transport {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        resolver: CredentialResolver,
        requests_per_second: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            resolver,
            limiter: RateLimiter::new(requests_per_second),
            timeout,
            state: AtomicU8::new(STATE_UNPAIRED),
        }
    }

    /// Current pairing state of this instance.
    pub fn state(&self) -> ConnectionState {
        match self.state.load(Ordering::Acquire) {
            STATE_PAIRED => ConnectionState::Paired,
            STATE_UNAUTHORIZED => ConnectionState::Unauthorized,
            _ => ConnectionState::Unpaired,
        }
    }

    /// GET `path`.
    pub async fn get(&self, ctx: &RequestContext, path: &str) -> Result<HttpResponse> {
        let request = self.build(HttpMethod::Get, path);
        self.dispatch(ctx, request, path).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, ctx: &RequestContext, path: &str) -> Result<HttpResponse> {
        let request = self.build(HttpMethod::Delete, path);
        self.dispatch(ctx, request, path).await
    }

    /// POST/PUT `body` as JSON to `path`.
    pub async fn send_json<B: Serialize + Sync>(
        &self,
        ctx: &RequestContext,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpResponse> {
        let request = self.build(method, path).json(body)?;
        self.dispatch(ctx, request, path).await
    }

    /// Resolve the active credential without issuing a request.
    ///
    /// `Some` moves an `Unpaired` instance to `Paired`.
    pub async fn resolve_credential(&self) -> Result<Option<String>> {
        let credential = self.resolver.resolve().await?;
        if credential.is_some() {
            let _ = self.state.compare_exchange(
                STATE_UNPAIRED,
                STATE_PAIRED,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
        Ok(credential)
    }

    /// A credential was just stored; an `Unauthorized` instance is usable
    /// again.
    pub(crate) fn credential_refreshed(&self) {
        self.state.store(STATE_PAIRED, Ordering::Release);
    }

    fn build(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    #[instrument(skip(self, ctx, request), fields(path = %path))]
    async fn dispatch(
        &self,
        ctx: &RequestContext,
        request: HttpRequest,
        path: &str,
    ) -> Result<HttpResponse> {
        self.limiter.acquire(ctx).await?;

        // A missing credential is not an error here: the not-yet-paired
        // request simply goes out unauthenticated and the bridge answers.
        let request = match self.resolve_credential().await? {
            Some(key) => request.header(APPLICATION_KEY_HEADER, key),
            None => request,
        };

        let response = tokio::select! {
            biased;
            _ = ctx.canceled() => return Err(ApiError::Canceled),
            result = self.http.execute(request) => result?,
        };

        debug!(status = response.status, "Bridge answered");

        match response.status {
            403 => {
                warn!("Bridge rejected the credential");
                self.state.store(STATE_UNAUTHORIZED, Ordering::Release);
                Err(ApiError::Unauthorized)
            }
            404 => Err(ApiError::NotFound(path.to_string())),
            503 => Err(ApiError::ServiceUnavailable),
            _ => Ok(response),
        }
    }
}
