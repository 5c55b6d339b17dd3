//! Typed exchange responses.
//!
//! Every body is decoded once, here, into either the expected
//! acknowledgement or an [`ApiError`]. Callers never see raw JSON.

use crate::error::{ExchangeError, ExchangeResult};
use chase_core::{ClientOrderId, OrderId, Price, Quantity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// HTTP status for "too many requests".
pub const HTTP_TOO_MANY_REQUESTS: u16 = 429;
/// HTTP status the exchange uses once an IP has been auto-banned.
pub const HTTP_IP_BANNED: u16 = 418;

/// Exchange error code for "too many requests", used when a rate-limited
/// response carries no parseable body.
const TOO_MANY_REQUESTS_CODE: i64 = -1003;

/// Exchange-level rejection, e.g. `{"code":-1013,"msg":"Filter failure: PRICE_FILTER"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub msg: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code={} msg={}", self.code, self.msg)
    }
}

/// Either the typed acknowledgement or the exchange's rejection.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Rejected(ApiError),
}

/// A decoded response plus the transport metadata the backoff needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// HTTP status code.
    pub status: u16,
    /// `Retry-After` hint, if the exchange sent one.
    pub retry_after: Option<Duration>,
    pub outcome: Outcome<T>,
}

impl<T> ApiResponse<T> {
    /// A 200 response carrying `value`.
    pub fn ok(value: T) -> Self {
        Self {
            status: 200,
            retry_after: None,
            outcome: Outcome::Ok(value),
        }
    }

    /// A rejection with the given HTTP status and exchange error.
    pub fn rejected(status: u16, code: i64, msg: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            outcome: Outcome::Rejected(ApiError {
                code,
                msg: msg.into(),
            }),
        }
    }

    /// A 429/418 rejection carrying a `Retry-After` hint.
    pub fn rate_limited(status: u16, retry_after: Duration) -> Self {
        Self {
            status,
            retry_after: Some(retry_after),
            outcome: Outcome::Rejected(ApiError {
                code: TOO_MANY_REQUESTS_CODE,
                msg: "Too many requests".to_string(),
            }),
        }
    }

    /// True for 429 (too many requests) and 418 (IP banned).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.status, HTTP_TOO_MANY_REQUESTS | HTTP_IP_BANNED)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, Outcome::Rejected(_))
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self.outcome {
            Outcome::Ok(value) => Ok(value),
            Outcome::Rejected(err) => Err(err),
        }
    }
}

/// Order lifecycle status as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PendingCancel,
    Rejected,
    Expired,
    ExpiredInMatch,
    #[serde(other)]
    Unknown,
}

/// Acknowledgement of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: OrderId,
    #[serde(default)]
    pub client_order_id: Option<ClientOrderId>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub executed_qty: Option<Quantity>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Acknowledgement of a cancel; `executed_qty` is the authoritative fill count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAck {
    pub order_id: OrderId,
    pub executed_qty: Quantity,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// The order-test endpoint answers `{}` on success.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestAck {}

/// Decode a response body into an [`ApiResponse`].
///
/// Objects carrying a `code` field are rejections; anything else must
/// decode as `T`. A rate-limited response with an unreadable body is still
/// reported as a rejection so the backoff sees it.
pub fn decode_body<T: DeserializeOwned>(
    status: u16,
    retry_after: Option<Duration>,
    body: &[u8],
) -> ExchangeResult<ApiResponse<T>> {
    let rate_limited = matches!(status, HTTP_TOO_MANY_REQUESTS | HTTP_IP_BANNED);

    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) if rate_limited => {
            return Ok(ApiResponse {
                status,
                retry_after,
                outcome: Outcome::Rejected(ApiError {
                    code: TOO_MANY_REQUESTS_CODE,
                    msg: String::from_utf8_lossy(body).into_owned(),
                }),
            });
        }
        Err(e) => {
            return Err(ExchangeError::Decode {
                status,
                message: format!("invalid JSON: {e}"),
            });
        }
    };

    let outcome = if value.get("code").is_some() {
        let err: ApiError = serde_json::from_value(value).map_err(|e| ExchangeError::Decode {
            status,
            message: format!("invalid error body: {e}"),
        })?;
        Outcome::Rejected(err)
    } else {
        let ack: T = serde_json::from_value(value).map_err(|e| ExchangeError::Decode {
            status,
            message: e.to_string(),
        })?;
        Outcome::Ok(ack)
    };

    Ok(ApiResponse {
        status,
        retry_after,
        outcome,
    })
}
