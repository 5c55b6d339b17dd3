//! Rate-limit backoff for exchange calls.
//!
//! The exchange answers 429 when the request weight budget is exceeded and
//! 418 once the IP has been auto-banned; both carry a `Retry-After` hint in
//! seconds. A single deadline is kept: every call waits for it, every
//! response either sets it (`now + retry_after`) or clears it.

use crate::api::{BoxFuture, ExchangeApi};
use crate::error::ExchangeResult;
use crate::response::{ApiResponse, CancelAck, OrderAck};
use chase_core::{BookTicker, OrderId, OrderRequest};
use chase_telemetry::Metrics;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Wait applied when a rate-limited response carries no `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Next-allowed-request deadline derived from rate-limit responses.
pub struct RateLimitBackoff {
    /// Calls must not start before this instant.
    delay_until: Mutex<Option<Instant>>,
    /// Used when the exchange omits the hint.
    fallback: Duration,
}

impl Default for RateLimitBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitBackoff {
    pub fn new() -> Self {
        Self::with_fallback(DEFAULT_RETRY_AFTER)
    }

    pub fn with_fallback(fallback: Duration) -> Self {
        Self {
            delay_until: Mutex::new(None),
            fallback,
        }
    }

    /// Current deadline, if one is pending.
    pub fn delay_until(&self) -> Option<Instant> {
        *self.delay_until.lock()
    }

    /// Suspend until the deadline has passed.
    pub async fn wait_ready(&self) {
        // Copy out so the lock is not held across the sleep.
        let deadline = *self.delay_until.lock();
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if deadline > now {
                debug!(
                    wait_ms = (deadline - now).as_millis() as u64,
                    "Delaying request for rate limit"
                );
                tokio::time::sleep_until(deadline).await;
            }
        }
    }

    /// Update the deadline from a response.
    pub fn observe<T>(&self, response: &ApiResponse<T>) {
        let mut delay_until = self.delay_until.lock();
        if response.is_rate_limited() {
            let wait = response.retry_after.unwrap_or(self.fallback);
            *delay_until = Some(Instant::now() + wait);
            Metrics::rate_limited(response.status);
            warn!(
                status = response.status,
                retry_after_ms = wait.as_millis() as u64,
                "Rate limited by exchange"
            );
        } else {
            *delay_until = None;
        }
    }

    /// Run `call` once the deadline allows it and record its response.
    ///
    /// Failed calls (no response) leave the deadline untouched.
    pub async fn guard<T, F>(&self, call: F) -> ExchangeResult<ApiResponse<T>>
    where
        F: Future<Output = ExchangeResult<ApiResponse<T>>>,
    {
        self.wait_ready().await;
        let result = call.await;
        if let Ok(response) = &result {
            self.observe(response);
        }
        result
    }
}

/// [`ExchangeApi`] wrapper that applies a [`RateLimitBackoff`] to every call.
pub struct RateLimited<E> {
    inner: E,
    backoff: RateLimitBackoff,
}

impl<E: ExchangeApi> RateLimited<E> {
    pub fn new(inner: E) -> Self {
        Self::with_backoff(inner, RateLimitBackoff::new())
    }

    pub fn with_backoff(inner: E, backoff: RateLimitBackoff) -> Self {
        Self { inner, backoff }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn backoff(&self) -> &RateLimitBackoff {
        &self.backoff
    }
}

impl<E: ExchangeApi> ExchangeApi for RateLimited<E> {
    fn get_order_book<'a>(
        &'a self,
        symbol: &'a str,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<BookTicker>>> {
        Box::pin(self.backoff.guard(self.inner.get_order_book(symbol)))
    }

    fn place_order<'a>(
        &'a self,
        order: &'a OrderRequest,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<OrderAck>>> {
        Box::pin(self.backoff.guard(self.inner.place_order(order)))
    }

    fn cancel_order<'a>(
        &'a self,
        symbol: &'a str,
        order_id: OrderId,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<CancelAck>>> {
        Box::pin(self.backoff.guard(self.inner.cancel_order(symbol, order_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_response_sets_deadline() {
        let backoff = RateLimitBackoff::new();
        let response: ApiResponse<()> = ApiResponse::rate_limited(429, Duration::from_secs(2));

        let before = Instant::now();
        backoff.observe(&response);

        assert_eq!(backoff.delay_until(), Some(before + Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_deadline() {
        let backoff = RateLimitBackoff::new();
        backoff.observe(&ApiResponse::<()>::rate_limited(418, Duration::from_secs(60)));
        assert!(backoff.delay_until().is_some());

        backoff.observe(&ApiResponse::ok(()));
        assert!(backoff.delay_until().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_hint_uses_fallback() {
        let backoff = RateLimitBackoff::with_fallback(Duration::from_millis(100));
        let mut response: ApiResponse<()> = ApiResponse::rejected(429, -1003, "Too many requests");
        response.retry_after = None;

        let before = Instant::now();
        backoff.observe(&response);
        assert_eq!(
            backoff.delay_until(),
            Some(before + Duration::from_millis(100))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_rejections_do_not_delay() {
        let backoff = RateLimitBackoff::new();
        backoff.observe(&ApiResponse::<()>::rejected(400, -1013, "Filter failure"));
        assert!(backoff.delay_until().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ready_sleeps_until_deadline() {
        let backoff = RateLimitBackoff::new();
        backoff.observe(&ApiResponse::<()>::rate_limited(429, Duration::from_secs(2)));

        let before = Instant::now();
        backoff.wait_ready().await;
        let waited = before.elapsed();
        assert!(waited >= Duration::from_secs(2));
        assert!(waited < Duration::from_millis(2_005));

        // Deadline already passed: no further wait.
        let again = Instant::now();
        backoff.wait_ready().await;
        assert_eq!(again.elapsed(), Duration::ZERO);
    }
}
