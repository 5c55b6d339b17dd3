//! Scripted exchange for tests and dry runs.
//!
//! Responses are queued per call kind and handed out in order; every
//! call is recorded for verification.

use crate::api::{BoxFuture, ExchangeApi};
use crate::error::{ExchangeError, ExchangeResult};
use crate::response::{ApiResponse, CancelAck, OrderAck, OrderStatus};
use chase_core::{BookTicker, OrderId, OrderRequest, Price, Quantity};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// A call received by [`MockExchange`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    OrderBook { symbol: String },
    Place(OrderRequest),
    Cancel { symbol: String, order_id: OrderId },
}

impl MockCall {
    pub fn is_place(&self) -> bool {
        matches!(self, Self::Place(_))
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel { .. })
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Mock exchange with per-endpoint response queues.
#[derive(Default)]
pub struct MockExchange {
    books: Mutex<VecDeque<ExchangeResult<ApiResponse<BookTicker>>>>,
    places: Mutex<VecDeque<ExchangeResult<ApiResponse<OrderAck>>>>,
    cancels: Mutex<VecDeque<ExchangeResult<ApiResponse<CancelAck>>>>,
    calls: Mutex<Vec<MockCall>>,
    /// Invoked when a book request finds the queue empty.
    on_books_exhausted: Mutex<Option<Hook>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a book ticker whose best bid is `bid`.
    pub fn push_bid(&self, bid: Price) -> &Self {
        self.push_book(Ok(ApiResponse::ok(ticker(bid))))
    }

    pub fn push_book(&self, response: ExchangeResult<ApiResponse<BookTicker>>) -> &Self {
        self.books.lock().push_back(response);
        self
    }

    /// Queue a rate-limited book response.
    pub fn push_book_rate_limited(&self, status: u16, retry_after: Duration) -> &Self {
        self.push_book(Ok(ApiResponse::rate_limited(status, retry_after)))
    }

    /// Queue an accepted placement with id `order_id`.
    pub fn push_place_ok(&self, order_id: u64) -> &Self {
        self.push_place(Ok(ApiResponse::ok(OrderAck {
            order_id: OrderId(order_id),
            client_order_id: None,
            price: None,
            executed_qty: Some(Quantity::ZERO),
            status: Some(OrderStatus::New),
        })))
    }

    pub fn push_place_rejected(&self, code: i64, msg: &str) -> &Self {
        self.push_place(Ok(ApiResponse::rejected(400, code, msg)))
    }

    pub fn push_place(&self, response: ExchangeResult<ApiResponse<OrderAck>>) -> &Self {
        self.places.lock().push_back(response);
        self
    }

    /// Queue a successful cancel reporting `executed` filled.
    pub fn push_cancel_ok(&self, order_id: u64, executed: Quantity) -> &Self {
        self.push_cancel(Ok(ApiResponse::ok(CancelAck {
            order_id: OrderId(order_id),
            executed_qty: executed,
            status: Some(OrderStatus::Canceled),
        })))
    }

    pub fn push_cancel_rejected(&self, code: i64, msg: &str) -> &Self {
        self.push_cancel(Ok(ApiResponse::rejected(400, code, msg)))
    }

    pub fn push_cancel(&self, response: ExchangeResult<ApiResponse<CancelAck>>) -> &Self {
        self.cancels.lock().push_back(response);
        self
    }

    /// Run `hook` whenever the book queue is empty (e.g. to request shutdown).
    pub fn on_books_exhausted(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_books_exhausted.lock() = Some(Box::new(hook));
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Placement requests, oldest first.
    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                MockCall::Place(order) => Some(order.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_cancel()).count()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().push(call);
    }

    fn next_book(&self) -> ExchangeResult<ApiResponse<BookTicker>> {
        let next = self.books.lock().pop_front();
        match next {
            Some(response) => response,
            None => {
                if let Some(hook) = self.on_books_exhausted.lock().as_ref() {
                    hook();
                }
                Err(exhausted("order book"))
            }
        }
    }
}

fn exhausted(kind: &str) -> ExchangeError {
    ExchangeError::Transport(format!("no scripted {kind} response"))
}

fn ticker(bid: Price) -> BookTicker {
    BookTicker {
        symbol: "MOCK".to_string(),
        bid_price: bid,
        bid_qty: Quantity::ONE,
        ask_price: bid,
        ask_qty: Quantity::ONE,
    }
}

impl ExchangeApi for MockExchange {
    fn get_order_book<'a>(
        &'a self,
        symbol: &'a str,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<BookTicker>>> {
        Box::pin(async move {
            self.record(MockCall::OrderBook {
                symbol: symbol.to_string(),
            });
            self.next_book()
        })
    }

    fn place_order<'a>(
        &'a self,
        order: &'a OrderRequest,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<OrderAck>>> {
        Box::pin(async move {
            self.record(MockCall::Place(order.clone()));
            let next = self.places.lock().pop_front();
            next.unwrap_or_else(|| Err(exhausted("place")))
        })
    }

    fn cancel_order<'a>(
        &'a self,
        symbol: &'a str,
        order_id: OrderId,
    ) -> BoxFuture<'a, ExchangeResult<ApiResponse<CancelAck>>> {
        Box::pin(async move {
            self.record(MockCall::Cancel {
                symbol: symbol.to_string(),
                order_id,
            });
            let next = self.cancels.lock().pop_front();
            next.unwrap_or_else(|| Err(exhausted("cancel")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_serves_in_order_and_records() {
        let mock = MockExchange::new();
        mock.push_bid(Price::new(dec!(10)))
            .push_bid(Price::new(dec!(9)));

        let first = mock.get_order_book("ABCUSDT").await.unwrap();
        let second = mock.get_order_book("ABCUSDT").await.unwrap();

        assert_eq!(first.into_result().unwrap().bid_price.inner(), dec!(10));
        assert_eq!(second.into_result().unwrap().bid_price.inner(), dec!(9));
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_book_runs_hook() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let mock = MockExchange::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        mock.on_books_exhausted(move || flag.store(true, Ordering::SeqCst));

        assert!(mock.get_order_book("ABCUSDT").await.is_err());
        assert!(fired.load(Ordering::SeqCst));
    }
}
