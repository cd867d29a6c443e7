//! Request Context
//!
//! Cancellation and deadline carrier threaded through every network call.
//! Owned by the caller; the transport never retains it beyond the call.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation/timeout context for a single logical operation.
///
/// Cloning is cheap and clones share the same cancellation token: canceling
/// one clone cancels them all. A context with neither a deadline nor a
/// cancel signal never fires, which is the correct behavior for callers that
/// rely on transport-level timeouts alone.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context without a deadline.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Context that fires after `timeout` elapses.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Context driven by an externally owned cancellation token.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Request cancellation of every operation using this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context has been canceled or its deadline has passed.
    pub fn is_canceled(&self) -> bool {
        if self.cancel.is_cancelled() {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Resolves once the context is canceled or the deadline passes.
    ///
    /// Pending forever when neither can fire; always race this against the
    /// actual operation, never await it alone.
    pub async fn canceled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_context_is_not_canceled() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_canceled());
    }

    #[tokio::test]
    async fn test_cancel_propagates_to_clones() {
        let ctx = RequestContext::new();
        let clone = ctx.clone();

        ctx.cancel();

        assert!(clone.is_canceled());
        clone.canceled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_canceled());

        ctx.canceled().await;
        assert!(ctx.is_canceled());
    }
}
