//! Core domain types for the sell-order chaser.
//!
//! This crate provides fundamental types used throughout the workspace:
//! - `Price`, `Quantity`: Precision-safe numeric types
//! - `OrderSpec`, `OrderRequest`: Order template and wire-ready request
//! - `OrderSide`, `OrderType`, `TimeInForce`: Trading enums
//! - `BookTicker`, `OrderBookSnapshot`: Top-of-book market data

pub mod decimal;
pub mod error;
pub mod order;
pub mod types;

pub use decimal::{Price, Quantity, PRICE_WIRE_DP};
pub use error::{CoreError, Result};
pub use order::{ClientOrderId, OrderId, OrderRequest, OrderSide, OrderSpec, OrderType, TimeInForce};
pub use types::{BookTicker, OrderBookSnapshot};
