//! Exchange access for the sell-order chaser.
//!
//! Everything the controller knows about the exchange goes through the
//! [`ExchangeApi`] trait:
//! - [`BinanceClient`]: signed REST transport with per-request timeouts
//! - [`RateLimited`]: wrapper that honours 429/418 `Retry-After` hints
//! - [`MockExchange`]: scripted responses for tests
//!
//! Responses are decoded once at this boundary into [`ApiResponse`], whose
//! [`Outcome`] is either the typed acknowledgement or an [`ApiError`].

pub mod api;
pub mod backoff;
pub mod client;
pub mod error;
pub mod mock;
pub mod response;
pub mod signer;

pub use api::{BoxFuture, DynExchange, ExchangeApi};
pub use backoff::{RateLimitBackoff, RateLimited, DEFAULT_RETRY_AFTER};
pub use client::{BinanceClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ExchangeError, ExchangeResult};
pub use mock::{MockCall, MockExchange};
pub use response::{
    decode_body, ApiError, ApiResponse, CancelAck, OrderAck, OrderStatus, Outcome, TestAck,
    HTTP_IP_BANNED, HTTP_TOO_MANY_REQUESTS,
};
pub use signer::{Credentials, RequestSigner};
