//! Order-related types and identifiers.
//!
//! Provides order side, type, time-in-force, identifiers and the
//! order template/request pair used by the chase controller.

use crate::decimal::{Price, Quantity};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side. The chaser only ever sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Sell,
}

impl OrderSide {
    /// Wire representation expected by the exchange.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-in-force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled (the chaser's resting orders).
    #[default]
    #[serde(rename = "GTC")]
    GoodTilCancelled,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoodTilCancelled => "GTC",
        }
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client order ID for reconciliation.
///
/// Every placement carries a fresh id so that an order whose
/// acknowledgement was lost can still be found in account history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `chase_{timestamp_ms}_{uuid_short}` (well under the
    /// exchange's 36 character limit).
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("chase_{ts}_{uuid_short}"))
    }

    /// Create from an existing string (for parsing responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Immutable order template for one run.
///
/// Combined with the current price and remaining quantity each cycle
/// to form an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
}

impl OrderSpec {
    /// GTC limit sell template for `symbol`.
    pub fn limit_sell(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Sell,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::GoodTilCancelled,
        }
    }

    /// Build a wire request at `price` for the whole units of `quantity`.
    ///
    /// # Errors
    /// `CoreError::InvalidPrice` for a non-positive price and
    /// `CoreError::InvalidQuantity` when fewer than one whole unit remains.
    pub fn request(&self, price: Price, quantity: Quantity) -> Result<OrderRequest> {
        if !price.is_positive() {
            return Err(CoreError::InvalidPrice(price.to_string()));
        }
        let units = quantity
            .whole_units()
            .filter(|units| *units > 0)
            .ok_or_else(|| CoreError::InvalidQuantity(quantity.to_string()))?;

        Ok(OrderRequest {
            symbol: self.symbol.clone(),
            side: self.side,
            order_type: self.order_type,
            time_in_force: self.time_in_force,
            quantity: units,
            price,
            client_order_id: ClientOrderId::new(),
        })
    }
}

/// A concrete order ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    /// Whole units only.
    pub quantity: u64,
    pub price: Price,
    pub client_order_id: ClientOrderId,
}

impl OrderRequest {
    /// Form parameters in the order the exchange documents them.
    pub fn wire_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.as_str().to_string()),
            ("type", self.order_type.as_str().to_string()),
            ("quantity", self.quantity.to_string()),
            ("price", self.price.to_wire()),
            ("timeInForce", self.time_in_force.as_str().to_string()),
            ("newClientOrderId", self.client_order_id.to_string()),
        ]
    }
}
