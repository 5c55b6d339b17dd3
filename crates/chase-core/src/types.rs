//! Market data types.
//!
//! Only the top of the book is consumed by the chaser.

use crate::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Best bid/ask for one symbol as reported by the book ticker endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTicker {
    pub symbol: String,
    pub bid_price: Price,
    pub bid_qty: Quantity,
    pub ask_price: Price,
    pub ask_qty: Quantity,
}

impl BookTicker {
    /// Snapshot of the only field the controller reads.
    pub fn snapshot(&self) -> OrderBookSnapshot {
        OrderBookSnapshot {
            best_bid: self.bid_price,
        }
    }
}

/// Best bid at the moment of polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBookSnapshot {
    pub best_bid: Price,
}

impl OrderBookSnapshot {
    /// An empty bid side is reported as a zero price.
    pub fn has_bid(&self) -> bool {
        self.best_bid.is_positive()
    }
}
