//! Request Rate Limiting
//!
//! Bridges fall over under bursty traffic, so every call through one client
//! instance passes a shared token bucket: steady rate, burst of 1. A caller
//! canceled while waiting for its slot aborts without the HTTP call ever
//! being issued.

use crate::error::{ApiError, Result};
use hub_traits::RequestContext;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket with a burst of 1.
///
/// Acquisition reserves the next free slot and sleeps until it arrives, so
/// concurrent callers are spaced at least one period apart in the order they
/// reserved. A canceled waiter burns its slot; that is acceptable waste, the
/// alternative (re-ordering the queue) buys nothing for this traffic.
pub struct RateLimiter {
    period: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Limiter admitting `requests_per_second` calls in steady state.
    /// Non-positive (or non-finite) rates disable limiting.
    pub fn new(requests_per_second: f64) -> Self {
        let period = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            period,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for the next slot, aborting with `Canceled` when `ctx` fires
    /// first.
    pub async fn acquire(&self, ctx: &RequestContext) -> Result<()> {
        if ctx.is_canceled() {
            return Err(ApiError::Canceled);
        }
        if self.period.is_zero() {
            return Ok(());
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next_slot.map_or(now, |at| at.max(now));
            *next_slot = Some(slot + self.period);
            slot
        };

        tokio::select! {
            biased;
            _ = ctx.canceled() => Err(ApiError::Canceled),
            _ = tokio::time::sleep_until(slot) => Ok(()),
        }
    }
}
