//! HTTP client for the exchange's spot REST API.
//!
//! Provides the three calls the chaser needs plus the order-test endpoint
//! used to validate credentials and order shape before a run.

use crate::api::{BoxFuture, ExchangeApi};
use crate::error::{ExchangeError, ExchangeResult};
use crate::response::{decode_body, ApiResponse, CancelAck, OrderAck, TestAck};
use crate::signer::RequestSigner;
use chase_core::{BookTicker, OrderId, OrderRequest};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

const BOOK_TICKER_PATH: &str = "/api/v3/ticker/bookTicker";
const ORDER_PATH: &str = "/api/v3/order";
const TEST_ORDER_PATH: &str = "/api/v3/order/test";

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Client for the exchange REST API.
pub struct BinanceClient {
    /// HTTP client (keep-alive connection pool).
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
    signer: RequestSigner,
}

impl BinanceClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - REST root (e.g., "https://api.binance.com")
    /// * `signer` - Signs trading requests
    /// * `timeout` - Hard per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        signer: RequestSigner,
        timeout: Duration,
    ) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ExchangeError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ExchangeError::HttpClient(format!("Invalid base URL {base_url}: {e}")))?;

        Ok(Self {
            client,
            base_url,
            signer,
        })
    }

    /// Validate an order against the test endpoint without placing it.
    pub async fn test_order(&self, order: &OrderRequest) -> ExchangeResult<ApiResponse<TestAck>> {
        self.send_signed(Method::POST, TEST_ORDER_PATH, &order.wire_params())
            .await
    }

    async fn fetch_book_ticker(&self, symbol: &str) -> ExchangeResult<ApiResponse<BookTicker>> {
        let mut url = self.endpoint(BOOK_TICKER_PATH)?;
        url.query_pairs_mut().append_pair("symbol", symbol);

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.signer.api_key())
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("GET {BOOK_TICKER_PATH}: {e}")))?;

        let decoded = read_response(response).await;
        debug!(
            symbol,
            latency_ms = started.elapsed().as_millis() as u64,
            "Book ticker fetched"
        );
        decoded
    }

    async fn submit_order(&self, order: &OrderRequest) -> ExchangeResult<ApiResponse<OrderAck>> {
        self.send_signed(Method::POST, ORDER_PATH, &order.wire_params())
            .await
    }

    async fn submit_cancel(
        &self,
        symbol: &str,
        order_id: OrderId,
    ) -> ExchangeResult<ApiResponse<CancelAck>> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        self.send_signed(Method::DELETE, ORDER_PATH, &params).await
    }

    fn endpoint(&self, path: &str) -> ExchangeResult<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| ExchangeError::HttpClient(format!("Invalid URL {raw}: {e}")))
    }

    /// Sign `params` and send them as the query string of `method path`.
    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<ApiResponse<T>> {
        let mut url = self.endpoint(path)?;
        let timestamp = chrono::Utc::now().timestamp_millis();
        self.signer.sign_url(&mut url, params, timestamp);

        let started = Instant::now();
        let response = self
            .client
            .request(method.clone(), url)
            .header(API_KEY_HEADER, self.signer.api_key())
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("{method} {path}: {e}")))?;

        let decoded = read_response(response).await;
        debug!(
            %method,
            path,
            latency_ms = started.elapsed().as_millis() as u64,
            "Signed request completed"
        );
        decoded
    }
}

/// Read status, `Retry-After` and body, then decode.
async fn read_response<T: DeserializeOwned>(response: Response) -> ExchangeResult<ApiResponse<T>> {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);

    let body = response
        .bytes()
        .await
        .map_err(|e| ExchangeError::Transport(format!("Failed to read body: {e}")))?;

    if status >= 500 {
        warn!(status, "Exchange returned server error");
    }

    decode_body(status, retry_after, &body)
}

/// `Retry-After` is a whole number of seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

impl ExchangeApi for BinanceClient {
    fn get_order_book<'a>(
        &'a self,
        symbol: &'a str,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<BookTicker>>> {
        Box::pin(self.fetch_book_ticker(symbol))
    }

    fn place_order<'a>(
        &'a self,
        order: &'a OrderRequest,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<OrderAck>>> {
        Box::pin(self.submit_order(order))
    }

    fn cancel_order<'a>(
        &'a self,
        symbol: &'a str,
        order_id: OrderId,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<CancelAck>>> {
        Box::pin(self.submit_cancel(symbol, order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::Credentials;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 120 "), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let signer = RequestSigner::new(Credentials::new("key", "secret").unwrap(), None);
        let client = BinanceClient::new("https://api.example.com/", signer, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
        assert_eq!(
            client.endpoint(ORDER_PATH).unwrap().as_str(),
            "https://api.example.com/api/v3/order"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let signer = RequestSigner::new(Credentials::new("key", "secret").unwrap(), None);
        let result = BinanceClient::new("api.example.com", signer, DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(ExchangeError::HttpClient(_))));
    }
}
