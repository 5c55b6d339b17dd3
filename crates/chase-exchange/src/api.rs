//! Exchange capability trait.
//!
//! The controller only ever talks to an [`ExchangeApi`]. This allows for:
//! - Dependency injection for testing
//! - Stacking wrappers such as [`crate::RateLimited`] around the transport

use std::pin::Pin;
use std::sync::Arc;

use chase_core::{BookTicker, OrderId, OrderRequest};

use crate::error::ExchangeResult;
use crate::response::{ApiResponse, CancelAck, OrderAck};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// The three calls the chase controller needs.
///
/// `Err` means no trustworthy answer was received (transport or decode
/// failure). Exchange rejections are `Ok` with [`crate::Outcome::Rejected`].
pub trait ExchangeApi: Send + Sync {
    /// Fetch the top of book for `symbol`.
    fn get_order_book<'a>(
        &'a self,
        symbol: &'a str,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<BookTicker>>>;

    /// Submit a new limit order.
    fn place_order<'a>(
        &'a self,
        order: &'a OrderRequest,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<OrderAck>>>;

    /// Cancel a resting order.
    fn cancel_order<'a>(
        &'a self,
        symbol: &'a str,
        order_id: OrderId,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<CancelAck>>>;
}

impl<E: ExchangeApi + ?Sized> ExchangeApi for Arc<E> {
    fn get_order_book<'a>(
        &'a self,
        symbol: &'a str,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<BookTicker>>> {
        (**self).get_order_book(symbol)
    }

    fn place_order<'a>(
        &'a self,
        order: &'a OrderRequest,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<OrderAck>>> {
        (**self).place_order(order)
    }

    fn cancel_order<'a>(
        &'a self,
        symbol: &'a str,
        order_id: OrderId,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<CancelAck>>> {
        (**self).cancel_order(symbol, order_id)
    }
}

/// Arc wrapper for ExchangeApi trait objects.
pub type DynExchange = Arc<dyn ExchangeApi>;
